//! 디버그 파일 입력 소스
//!
//! 시작 시 파일을 한 번 읽어 두고, `first_secs` 후 그리고 이후 `interval_secs`마다
//! 같은 내용을 [`JsonLinesCodec`]으로 디코딩하여 채널로 보냅니다.
//! 스테이지 체인을 고정된 입력으로 반복 실행할 때 사용합니다.
//!
//! 파일을 읽지 못하면 [`DebugFileInput::run`]이 에러를 반환하고,
//! 디코딩 에러는 로그만 남깁니다.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stagehand_core::event::{LogEvent, MESSAGE_FIELD};
use stagehand_core::metrics::{INPUT_EVENTS_TOTAL, LABEL_STAGE};
use stagehand_core::value::Value;

use crate::error::FilterError;

/// 설정 파일의 모듈명 (생성된 이벤트의 태그로도 사용)
pub const MODULE_NAME: &str = "debugfile";

/// JSON으로 해석할 수 없는 줄에 붙는 태그
pub const CODEC_ERROR_TAG: &str = "stagehand_codec_json_error";

/// 타임스탬프 키
const TIMESTAMP_KEY: &str = "@timestamp";

/// 디버그 파일 입력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugFileConfig {
    /// 읽을 파일
    pub input: PathBuf,
    /// 첫 실행까지 대기 시간 (초, 최소 1)
    pub first_secs: u64,
    /// 실행 간격 (초)
    pub interval_secs: u64,
}

impl Default for DebugFileConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            first_secs: 1,
            interval_secs: 30,
        }
    }
}

impl DebugFileConfig {
    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.input.as_os_str().is_empty() {
            return Err(FilterError::Config {
                field: "debugfile.input".to_owned(),
                reason: "input file must be set".to_owned(),
            });
        }
        if self.interval_secs == 0 {
            return Err(FilterError::Config {
                field: "debugfile.interval_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}

/// JSON 라인 디코더
///
/// 비어 있지 않은 각 줄을 JSON 객체로 해석합니다.
/// `message` 키는 본문, `@timestamp`(RFC 3339)는 이벤트 시각이 되고
/// 나머지 키는 `extra`에 들어갑니다. `null` 값은 버립니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesCodec;

impl JsonLinesCodec {
    /// 데이터를 이벤트 목록으로 디코딩합니다. 모든 이벤트에 `tags`가 붙습니다.
    pub fn decode(&self, data: &[u8], tags: &[&str]) -> Vec<LogEvent> {
        String::from_utf8_lossy(data)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let mut event = Self::decode_line(line);
                for tag in tags {
                    event.add_tag(*tag);
                }
                event
            })
            .collect()
    }

    fn decode_line(line: &str) -> LogEvent {
        let object = match serde_json::from_str::<serde_json::Value>(line) {
            Ok(serde_json::Value::Object(object)) => object,
            Ok(other) => {
                warn!(kind = json_kind(&other), "json line is not an object");
                return Self::error_event(line);
            }
            Err(e) => {
                warn!(error = %e, "invalid json line");
                return Self::error_event(line);
            }
        };

        let mut event = LogEvent::new();
        for (key, value) in object {
            if key == TIMESTAMP_KEY {
                if let Some(ts) = value.as_str().and_then(parse_timestamp) {
                    event.timestamp = ts;
                    continue;
                }
            }
            if key == MESSAGE_FIELD {
                if let serde_json::Value::String(message) = value {
                    event.message = Some(message);
                    continue;
                }
            }
            if let Some(value) = Value::from_json(value) {
                event.set(key, value);
            }
        }
        event
    }

    fn error_event(line: &str) -> LogEvent {
        let mut event = LogEvent::with_message(line);
        event.add_tag(CODEC_ERROR_TAG);
        event
    }
}

fn parse_timestamp(raw: &str) -> Option<SystemTime> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(SystemTime::from)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// 디버그 파일 입력 소스
#[derive(Debug)]
pub struct DebugFileInput {
    config: DebugFileConfig,
    codec: JsonLinesCodec,
}

impl DebugFileInput {
    /// 설정으로 입력 소스를 생성합니다.
    pub fn new(config: DebugFileConfig) -> Result<Self, FilterError> {
        config.validate()?;
        Ok(Self {
            config,
            codec: JsonLinesCodec,
        })
    }

    /// 입력을 실행합니다.
    ///
    /// cancellation token이 발동되거나 수신 측 채널이 닫히면 `Ok(())`로 종료됩니다.
    pub async fn run(
        &self,
        tx: mpsc::Sender<LogEvent>,
        cancel: CancellationToken,
    ) -> Result<(), FilterError> {
        let content = tokio::fs::read(&self.config.input).await?;
        info!(
            input = %self.config.input.display(),
            bytes = content.len(),
            "debug file input started"
        );

        let mut delay = Duration::from_secs(self.config.first_secs.max(1));
        let interval = Duration::from_secs(self.config.interval_secs);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("debug file input received shutdown signal");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let events = self.codec.decode(&content, &[MODULE_NAME]);
            debug!(count = events.len(), "debug file decoded");

            for event in events {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    sent = tx.send(event) => {
                        if sent.is_err() {
                            info!("event channel closed, stopping debug file input");
                            return Ok(());
                        }
                        counter!(INPUT_EVENTS_TOTAL, LABEL_STAGE => MODULE_NAME).increment(1);
                    }
                }
            }

            delay = interval;
        }
    }
}
