//! 스테이지 계약: 모든 처리 스테이지가 구현하는 단일 진입점
//!
//! 오케스트레이터는 이벤트를 하나씩 [`Stage::process`]에 전달합니다.
//! 스테이지는 필요한 필드를 이벤트에서 읽고, 작업을 수행한 뒤,
//! 결과 필드를 이벤트에 기록하여 성공 여부와 함께 반환합니다.
//!
//! # 반환 규약
//! - `true`: 변환 성공, 하위 스테이지는 이벤트가 보강된 것으로 간주
//! - `false`: 작업 실패. 실패한 스테이지를 식별하는 에러 태그를 붙이고 원인을 로깅합니다.
//!   이벤트는 그대로 하위로 흘러가며, 스테이지가 이벤트를 버리는 일은 없습니다.
//!
//! # 동시성
//! 같은 스테이지 인스턴스가 서로 다른 이벤트에 대해 동시에 호출될 수 있으므로
//! `process`는 `&self`만 받으며, 초기화 이후 설정은 읽기 전용입니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use metrics::{counter, histogram};

use crate::event::LogEvent;
use crate::metrics::{
    LABEL_RESULT, LABEL_STAGE, RESULT_FAILURE, RESULT_SUCCESS, STAGE_EVENTS_TOTAL,
    STAGE_PROCESSING_DURATION_SECONDS,
};

/// `Send` 박스 퓨처
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 처리 스테이지 trait
///
/// # 구현 예시
/// ```ignore
/// struct Upper;
///
/// impl Stage for Upper {
///     fn name(&self) -> &str { "upper" }
///     fn error_tag(&self) -> &str { "stagehand_filter_upper_error" }
///
///     async fn process(&self, mut event: LogEvent) -> (LogEvent, bool) {
///         let upper = event.get_str("message").to_uppercase();
///         event.set("message", upper);
///         succeed(event, self.name())
///     }
/// }
/// ```
pub trait Stage: Send + Sync {
    /// 스테이지 이름 (설정 파일의 모듈명)
    fn name(&self) -> &str;

    /// 실패 시 이벤트에 추가되는 태그
    fn error_tag(&self) -> &str;

    /// 이벤트 하나를 처리합니다.
    fn process(&self, event: LogEvent) -> impl Future<Output = (LogEvent, bool)> + Send;
}

/// dyn-compatible 스테이지 trait
///
/// `Stage` trait은 RPITIT를 사용하므로 `dyn Stage`가 불가합니다.
/// `DynStage`는 `BoxFuture`를 반환하여 `Vec<Box<dyn DynStage>>`로
/// 스테이지를 동적으로 관리할 수 있게 합니다.
pub trait DynStage: Send + Sync {
    /// 스테이지 이름
    fn name(&self) -> &str;

    /// 실패 시 이벤트에 추가되는 태그
    fn error_tag(&self) -> &str;

    /// 이벤트 하나를 처리합니다.
    fn process(&self, event: LogEvent) -> BoxFuture<'_, (LogEvent, bool)>;
}

/// Stage를 구현한 타입은 자동으로 DynStage도 구현됩니다.
impl<T: Stage> DynStage for T {
    fn name(&self) -> &str {
        Stage::name(self)
    }

    fn error_tag(&self) -> &str {
        Stage::error_tag(self)
    }

    fn process(&self, event: LogEvent) -> BoxFuture<'_, (LogEvent, bool)> {
        Box::pin(Stage::process(self, event))
    }
}

/// 실패 처리: 에러 태그를 추가하고 원인을 로깅한 뒤 `(event, false)`를 반환합니다.
pub fn fail(
    mut event: LogEvent,
    stage: &str,
    error_tag: &str,
    cause: &dyn fmt::Display,
) -> (LogEvent, bool) {
    tracing::error!(stage, error = %cause, "stage failed");
    event.add_tag(error_tag);
    counter!(STAGE_EVENTS_TOTAL, LABEL_STAGE => stage.to_owned(), LABEL_RESULT => RESULT_FAILURE)
        .increment(1);
    (event, false)
}

/// 성공 처리: 성공 카운터를 올리고 `(event, true)`를 반환합니다.
pub fn succeed(event: LogEvent, stage: &str) -> (LogEvent, bool) {
    counter!(STAGE_EVENTS_TOTAL, LABEL_STAGE => stage.to_owned(), LABEL_RESULT => RESULT_SUCCESS)
        .increment(1);
    (event, true)
}

/// 스테이지 처리 시간을 측정하여 히스토그램에 기록합니다.
///
/// 드롭될 때 경과 시간을 기록하므로 모든 반환 경로에서 측정됩니다.
pub struct StageTimer {
    stage: String,
    started: Instant,
}

impl StageTimer {
    /// 측정을 시작합니다.
    pub fn start(stage: &str) -> Self {
        Self {
            stage: stage.to_owned(),
            started: Instant::now(),
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        histogram!(STAGE_PROCESSING_DURATION_SECONDS, LABEL_STAGE => self.stage.clone())
            .record(self.started.elapsed().as_secs_f64());
    }
}
