//! 스테이지 설정
//!
//! [`StagehandConfig`]는 공통 설정([`GeneralConfig`])과 스테이지별 섹션을
//! 하나의 TOML 문서로 묶습니다. 섹션이 없는 스테이지는 비활성입니다.
//!
//! ```toml
//! chain = ["downloadfile", "hashfile", "deletefile"]
//!
//! [general]
//! log_level = "debug"
//!
//! [downloadfile]
//! auth_field = "auth"
//! retry_codes = [503]
//!
//! [hashfile]
//! algos = ["sha256", "md5"]
//!
//! [deletefile]
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stagehand_core::config::{GeneralConfig, load_toml, parse_toml};
use stagehand_core::error::{ConfigError, StagehandError};

use crate::chain::StageChain;
use crate::delete::{self, DeleteFileConfig, DeleteFileStage};
use crate::download::{self, DownloadFileConfig, DownloadFileStage};
use crate::hash::{self, HashFileConfig, HashFileStage, HashRegistry};
use crate::input::DebugFileConfig;
use crate::syslog::{self, SyslogConfig, SyslogStage};

/// 전체 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StagehandConfig {
    /// 공통 설정
    pub general: GeneralConfig,
    /// 체인 실행 순서 (모듈명)
    pub chain: Vec<String>,
    /// 파일 해시 스테이지
    pub hashfile: Option<HashFileConfig>,
    /// 파일 다운로드 스테이지
    pub downloadfile: Option<DownloadFileConfig>,
    /// syslog 분해 스테이지
    pub syslog: Option<SyslogConfig>,
    /// 파일 삭제 스테이지
    pub deletefile: Option<DeleteFileConfig>,
    /// 디버그 파일 입력
    pub debugfile: Option<DebugFileConfig>,
}

impl StagehandConfig {
    /// TOML 문자열을 파싱하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    pub fn parse(toml_str: &str) -> Result<Self, StagehandError> {
        let mut config: Self = parse_toml(toml_str)?;
        config.general.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일을 로드합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StagehandError> {
        let mut config: Self = load_toml(path).await?;
        config.general.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), StagehandError> {
        self.general.validate()?;

        if let Some(download) = &self.downloadfile {
            download.validate()?;
        }
        if let Some(syslog) = &self.syslog {
            syslog.validate()?;
        }
        if let Some(debugfile) = &self.debugfile {
            debugfile.validate()?;
        }

        for name in &self.chain {
            if !self.has_stage(name) {
                return Err(ConfigError::InvalidValue {
                    field: "chain".to_owned(),
                    reason: format!("stage '{name}' is not configured"),
                }
                .into());
            }
        }

        Ok(())
    }

    fn has_stage(&self, name: &str) -> bool {
        match name {
            hash::MODULE_NAME => self.hashfile.is_some(),
            download::MODULE_NAME => self.downloadfile.is_some(),
            syslog::MODULE_NAME => self.syslog.is_some(),
            delete::MODULE_NAME => self.deletefile.is_some(),
            _ => false,
        }
    }

    /// `chain` 순서대로 스테이지를 생성합니다.
    pub async fn build_chain(&self, registry: Arc<HashRegistry>) -> Result<StageChain, StagehandError> {
        let mut chain = StageChain::new();

        for name in &self.chain {
            match name.as_str() {
                hash::MODULE_NAME => {
                    let config = self.hashfile.clone().unwrap_or_default();
                    chain.push_boxed(Box::new(HashFileStage::new(config, Arc::clone(&registry))?));
                }
                download::MODULE_NAME => {
                    let config = self.downloadfile.clone().unwrap_or_default();
                    chain.push_boxed(Box::new(DownloadFileStage::new(config).await?));
                }
                syslog::MODULE_NAME => {
                    let config = self.syslog.clone().unwrap_or_default();
                    chain.push_boxed(Box::new(SyslogStage::new(config)?));
                }
                delete::MODULE_NAME => {
                    let config = self.deletefile.clone().unwrap_or_default();
                    chain.push_boxed(Box::new(DeleteFileStage::new(config)?));
                }
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "chain".to_owned(),
                        reason: format!("unknown stage '{other}'"),
                    }
                    .into());
                }
            }
        }

        tracing::info!(stages = ?chain.names(), "stage chain built");
        Ok(chain)
    }
}
