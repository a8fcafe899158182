//! 파일 삭제 스테이지
//!
//! 이벤트 필드가 가리키는 로컬 파일을 삭제합니다.
//! 주로 다운로드 → 해시 이후 임시 파일 정리에 사용합니다.
//!
//! 필드가 없거나 문자열이 아니면 "할 일 없음"으로 보고 태그 없이 `false`를 반환합니다.

use serde::{Deserialize, Serialize};
use tracing::debug;

use stagehand_core::config::require_field_name;
use stagehand_core::event::LogEvent;
use stagehand_core::stage::{Stage, StageTimer, fail, succeed};

use crate::error::FilterError;

/// 설정 파일의 모듈명
pub const MODULE_NAME: &str = "deletefile";

/// 삭제 실패 시 추가되는 태그
pub const ERROR_TAG: &str = "stagehand_filter_deletefile_error";

/// 삭제 스테이지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteFileConfig {
    /// 삭제할 파일 경로를 담은 필드
    pub field: String,
}

impl Default for DeleteFileConfig {
    fn default() -> Self {
        Self {
            field: "file_name".to_owned(),
        }
    }
}

/// 파일 삭제 스테이지
#[derive(Debug)]
pub struct DeleteFileStage {
    field: String,
}

impl DeleteFileStage {
    /// 설정으로 스테이지를 생성합니다.
    pub fn new(config: DeleteFileConfig) -> Result<Self, FilterError> {
        require_field_name("deletefile.field", &config.field)?;
        Ok(Self {
            field: config.field,
        })
    }
}

impl Stage for DeleteFileStage {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn error_tag(&self) -> &str {
        ERROR_TAG
    }

    async fn process(&self, event: LogEvent) -> (LogEvent, bool) {
        let _timer = StageTimer::start(MODULE_NAME);

        let Some(path) = event.get_opt_str(&self.field).map(str::to_owned) else {
            debug!(field = %self.field, "no file deleted (missing name)");
            return (event, false);
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path, "file deleted");
                succeed(event, MODULE_NAME)
            }
            Err(e) => fail(event, MODULE_NAME, ERROR_TAG, &FilterError::Io(e)),
        }
    }
}
