//! 스테이지 에러 타입
//!
//! [`FilterError`]는 스테이지 내부에서 발생하는 모든 에러를 표현합니다.
//! 초기화 단계의 에러(알 수 없는 알고리즘, 지원하지 않는 형식, 필드명 누락)는
//! 스테이지 생성을 실패시키고, 이벤트 단위 에러는 태그와 로그로 보고됩니다.
//! `From<FilterError> for StagehandError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use stagehand_core::error::{ConfigError, StageError, StagehandError};

/// 스테이지 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 레지스트리에 없는 해시 알고리즘
    #[error("{0} not supported")]
    UnsupportedAlgorithm(String),

    /// 지원하지 않는 syslog 형식
    #[error("unsupported syslog format: {0}")]
    UnsupportedFormat(String),

    /// URL 필드가 비어 있음
    #[error("empty url")]
    EmptyUrl,

    /// http/https가 아닌 URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// URL 파싱 실패
    #[error("url parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// 요청 헤더 이름 또는 값이 유효하지 않음
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// 헤더 이름
        name: String,
        /// 에러 사유
        reason: String,
    },

    /// HTTP 전송 에러 (연결 실패, 타임아웃 등)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// 성공 목록에 없는 HTTP 상태 코드
    #[error("downloaded {url}, got HTTP status {status} (retryable: {retryable})")]
    HttpStatus {
        /// 요청 URL
        url: String,
        /// 응답 상태 코드
        status: u16,
        /// 재시도 가능 목록 포함 여부
        retryable: bool,
    },

    /// 메시지 파싱 실패
    #[error("parse error: {format} at offset {offset}: {reason}")]
    Parse {
        /// 파서 형식 (rfc5424, rfc3164, json 등)
        format: String,
        /// 실패 위치 (바이트 오프셋)
        offset: usize,
        /// 실패 사유
        reason: String,
    },

    /// 파싱은 되었으나 유효하지 않은 메시지
    #[error("invalid message")]
    InvalidMessage,

    /// 필수 필드가 없음
    #[error("missing field: {0}")]
    MissingField(String),

    /// 필드 타입이 기대와 다름
    #[error("field '{field}' is {found}, expected {expected}")]
    FieldType {
        /// 필드명
        field: String,
        /// 기대한 타입
        expected: &'static str,
        /// 실제 타입
        found: &'static str,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 에러
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FilterError {
    /// 재시도 가능한 상태 코드로 실패했는지 여부
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus {
                retryable: true,
                ..
            }
        )
    }
}

impl From<ConfigError> for FilterError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidValue { field, reason } => Self::Config { field, reason },
            other => Self::Config {
                field: "config".to_owned(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<FilterError> for StagehandError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Io(e) => StagehandError::Io(e),
            FilterError::Config { field, reason } => {
                StagehandError::Config(ConfigError::InvalidValue { field, reason })
            }
            other => StagehandError::Stage(StageError::InitFailed {
                stage: "filter".to_owned(),
                reason: other.to_string(),
            }),
        }
    }
}
