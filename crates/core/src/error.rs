//! 에러 타입: 도메인별 에러 정의

/// Stagehand 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum StagehandError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스테이지 생성/처리 에러
    #[error("stage error: {0}")]
    Stage(#[from] StageError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스테이지 에러
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// 스테이지 초기화 실패
    #[error("stage '{stage}' init failed: {reason}")]
    InitFailed { stage: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: StagehandError = ConfigError::InvalidValue {
            field: "general.log_level".to_owned(),
            reason: "bad".to_owned(),
        }
        .into();
        assert!(matches!(err, StagehandError::Config(_)));
        assert!(err.to_string().contains("general.log_level"));
    }

    #[test]
    fn stage_error_display() {
        let err = StageError::InitFailed {
            stage: "hashfile".to_owned(),
            reason: "md6 not supported".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("hashfile"));
        assert!(msg.contains("md6"));
    }
}
