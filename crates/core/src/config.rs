//! 설정 관리: 공통 설정 및 TOML 로딩 헬퍼
//!
//! [`GeneralConfig`]는 로깅 등 모든 스테이지가 공유하는 설정입니다.
//! 스테이지별 설정은 각 스테이지 크레이트가 정의하며,
//! [`parse_toml`] / [`load_toml`]로 같은 방식으로 읽습니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`STAGEHAND_LOG_LEVEL=debug` 형식)
//! 2. 설정 파일 (TOML)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), stagehand_core::error::StagehandError> {
//! use stagehand_core::config::{GeneralConfig, parse_toml};
//!
//! let general: GeneralConfig = parse_toml("log_level = \"debug\"")?;
//! general.validate()?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StagehandError};

/// 허용되는 로그 레벨
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 허용되는 로그 형식
const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

impl GeneralConfig {
    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// - `STAGEHAND_LOG_LEVEL`
    /// - `STAGEHAND_LOG_FORMAT`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.log_level, "STAGEHAND_LOG_LEVEL");
        override_string(&mut self.log_format, "STAGEHAND_LOG_FORMAT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), StagehandError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            }
            .into());
        }

        if !VALID_LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            }
            .into());
        }

        Ok(())
    }
}

/// TOML 문자열에서 설정을 파싱합니다.
pub fn parse_toml<T: DeserializeOwned>(toml_str: &str) -> Result<T, StagehandError> {
    toml::from_str(toml_str).map_err(|e| {
        StagehandError::Config(ConfigError::ParseFailed {
            reason: e.to_string(),
        })
    })
}

/// TOML 파일에서 설정을 로드합니다.
pub async fn load_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, StagehandError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StagehandError::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            })
        } else {
            StagehandError::Io(e)
        }
    })?;
    parse_toml(&content)
}

/// 필드명 설정이 비어 있지 않은지 검증합니다.
///
/// 스테이지 초기화 시 필수 필드명 누락을 설정 에러로 보고하는 데 사용합니다.
pub fn require_field_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: "field name must not be empty".to_owned(),
        });
    }
    Ok(())
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        if val.is_empty() {
            warn!(env_key, "empty env var, ignoring");
            return;
        }
        *target = val;
    }
}
