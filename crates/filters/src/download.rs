//! 파일 다운로드 스테이지
//!
//! 이벤트의 URL 필드가 가리키는 리소스를 HTTP GET으로 받아 다운로드 디렉토리에
//! 고유한 이름의 파일로 저장하고, 저장 경로와 바이트 수(선택적으로 응답 헤더)를
//! 이벤트에 기록합니다.
//!
//! # 요청 헤더
//! 이벤트의 헤더 맵 필드를 먼저 적용하고, 인증자 헤더가 같은 이름을 덮어씁니다.
//! 인증자는 이벤트의 `auth_field` 값(이름)과 URL의 호스트로 해석합니다.
//!
//! # 실패 처리
//! 스테이지 내부에서는 재시도하지 않습니다. 응답 상태가 `retry_codes`에 있으면
//! [`RETRYABLE_TAG`]를 추가로 붙여 상위 레이어가 재시도 여부를 결정하게 합니다.
//! 본문 저장 중 에러가 나면 부분 파일은 삭제됩니다.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use metrics::counter;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::{Host, Url};

use stagehand_core::config::require_field_name;
use stagehand_core::event::LogEvent;
use stagehand_core::metrics::{DOWNLOAD_BYTES_TOTAL, DOWNLOAD_RETRYABLE_FAILURES_TOTAL};
use stagehand_core::stage::{Stage, StageTimer, fail, succeed};
use stagehand_core::value::Value;

use crate::auth::{Authenticator, AuthenticatorSet};
use crate::error::FilterError;

/// 설정 파일의 모듈명
pub const MODULE_NAME: &str = "downloadfile";

/// 실패 시 추가되는 태그
pub const ERROR_TAG: &str = "stagehand_filter_downloadfile_error";

/// 재시도 가능한 상태 코드로 실패했을 때 추가되는 태그
pub const RETRYABLE_TAG: &str = "stagehand_filter_downloadfile_retryable";

/// 다운로드 스테이지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadFileConfig {
    /// 다운로드할 URL을 담은 이벤트 필드
    pub url_field: String,
    /// 추가 요청 헤더 맵을 담은 이벤트 필드
    pub headers_field: String,
    /// 인증자 이름을 담은 이벤트 필드 (비어 있으면 인증자 미사용)
    pub auth_field: String,
    /// 저장된 파일 경로를 기록할 필드
    pub file_name_field: String,
    /// 저장된 바이트 수를 기록할 필드
    pub size_field: String,
    /// 응답 헤더를 기록할 필드 (비어 있으면 기록하지 않음)
    pub response_field: String,
    /// 다운로드 디렉토리 (없으면 시스템 임시 디렉토리)
    pub download_dir: Option<PathBuf>,
    /// 설정에 직접 적은 인증자
    pub authenticators: Vec<Authenticator>,
    /// 인증자 JSON 파일
    pub authenticator_file: Option<PathBuf>,
    /// 성공으로 간주하는 상태 코드
    pub success_codes: Vec<u16>,
    /// 재시도 가능한 상태 코드
    pub retry_codes: Vec<u16>,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 저장 파일명 접두어
    pub file_prefix: String,
}

impl Default for DownloadFileConfig {
    fn default() -> Self {
        Self {
            url_field: "url".to_owned(),
            headers_field: "extra_headers".to_owned(),
            auth_field: String::new(),
            file_name_field: "file_name".to_owned(),
            size_field: "file_size".to_owned(),
            response_field: String::new(),
            download_dir: None,
            authenticators: Vec::new(),
            authenticator_file: None,
            success_codes: vec![200],
            retry_codes: vec![500, 502, 504, 423, 501, 408, 503, 429],
            timeout_secs: 30,
            file_prefix: "stagehand-".to_owned(),
        }
    }
}

impl DownloadFileConfig {
    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FilterError> {
        require_field_name("downloadfile.url_field", &self.url_field)?;
        require_field_name("downloadfile.file_name_field", &self.file_name_field)?;
        require_field_name("downloadfile.size_field", &self.size_field)?;

        if self.success_codes.is_empty() {
            return Err(FilterError::Config {
                field: "downloadfile.success_codes".to_owned(),
                reason: "at least one success code is required".to_owned(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(FilterError::Config {
                field: "downloadfile.timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 상태 코드가 집합에 포함되는지 확인합니다.
pub fn is_status_in(status: u16, set: &[u16]) -> bool {
    set.contains(&status)
}

/// 파일 다운로드 스테이지
#[derive(Debug)]
pub struct DownloadFileStage {
    config: DownloadFileConfig,
    authenticators: AuthenticatorSet,
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl DownloadFileStage {
    /// 설정을 검증하고 모든 출처에서 인증자를 로드하여 스테이지를 생성합니다.
    pub async fn new(config: DownloadFileConfig) -> Result<Self, FilterError> {
        config.validate()?;
        let authenticators = AuthenticatorSet::load(
            config.authenticators.clone(),
            config.authenticator_file.as_deref(),
        )
        .await;
        Self::with_authenticators(config, authenticators)
    }

    /// 이미 해석된 인증자 목록으로 스테이지를 생성합니다.
    pub fn with_authenticators(
        config: DownloadFileConfig,
        authenticators: AuthenticatorSet,
    ) -> Result<Self, FilterError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let download_dir = config
            .download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            config,
            authenticators,
            client,
            download_dir,
        })
    }

    /// 스테이지 설정
    pub fn config(&self) -> &DownloadFileConfig {
        &self.config
    }

    /// 네트워크 호출 전에 이벤트의 URL을 검증합니다.
    ///
    /// 비어 있으면 [`FilterError::EmptyUrl`], 파싱 실패는 [`FilterError::UrlParse`],
    /// http/https가 아니면 [`FilterError::InvalidUrl`]입니다.
    pub fn validate_event(&self, event: &LogEvent) -> Result<Url, FilterError> {
        let raw = event.get_str(&self.config.url_field);
        if raw.is_empty() {
            return Err(FilterError::EmptyUrl);
        }

        let url = Url::parse(raw)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FilterError::InvalidUrl(format!(
                "unsupported scheme '{other}' in {raw}"
            ))),
        }
    }

    /// 이벤트의 URL을 다운로드하여 저장하고 결과 필드를 기록합니다.
    pub async fn download_file(&self, event: &mut LogEvent) -> Result<(), FilterError> {
        let url = self.validate_event(event)?;
        let headers = self.request_headers(event, &url)?;

        let response = self.client.get(url.clone()).headers(headers).send().await?;

        let status = response.status().as_u16();
        if !is_status_in(status, &self.config.success_codes) {
            return Err(FilterError::HttpStatus {
                url: url.to_string(),
                status,
                retryable: is_status_in(status, &self.config.retry_codes),
            });
        }

        let response_headers =
            (!self.config.response_field.is_empty()).then(|| headers_to_value(response.headers()));

        let (path, size) = self.save_body(response).await?;
        counter!(DOWNLOAD_BYTES_TOTAL).increment(size);
        debug!(url = %url, path = %path.display(), size, "file downloaded");

        event.set(
            self.config.file_name_field.as_str(),
            path.display().to_string(),
        );
        event.set(self.config.size_field.as_str(), size);
        if let Some(headers) = response_headers {
            event.set(self.config.response_field.as_str(), headers);
        }
        Ok(())
    }

    /// 이벤트 헤더를 적용한 뒤 인증자 헤더로 덮어씁니다.
    fn request_headers(&self, event: &LogEvent, url: &Url) -> Result<HeaderMap, FilterError> {
        let mut headers = HeaderMap::new();
        for (name, value) in event.get_string_map(&self.config.headers_field) {
            insert_header(&mut headers, &name, &value)?;
        }

        if !self.config.auth_field.is_empty() {
            let auth_name = event.get_str(&self.config.auth_field);
            let host = request_host(url);
            for (name, value) in self.authenticators.headers_for(auth_name, &host) {
                insert_header(&mut headers, &name, &value)?;
            }
        }

        Ok(headers)
    }

    /// 다운로드 디렉토리에 고유한 이름의 파일을 만듭니다.
    async fn create_temp_file(&self) -> Result<tempfile::NamedTempFile, FilterError> {
        let prefix = self.config.file_prefix.clone();
        let dir = self.download_dir.clone();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix(&prefix).tempfile_in(&dir)
        })
        .await
        .map_err(|e| std::io::Error::other(format!("spawn_blocking failed: {e}")))??;
        Ok(named)
    }

    /// 응답 본문을 청크 단위로 새 파일에 씁니다.
    ///
    /// 에러로 반환되면 임시 경로가 드롭되며 부분 파일이 삭제됩니다.
    async fn save_body(&self, mut response: reqwest::Response) -> Result<(PathBuf, u64), FilterError> {
        let named = self.create_temp_file().await?;
        let (std_file, temp_path) = named.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        let path = temp_path.keep().map_err(|e| FilterError::Io(e.error))?;
        Ok((path, written))
    }
}

/// 인증자 매칭에 쓰는 호스트 이름 (포트 제외, IPv6는 대괄호 제외)
fn request_host(url: &Url) -> String {
    match url.host() {
        Some(Host::Ipv6(addr)) => addr.to_string(),
        Some(host) => host.to_string(),
        None => String::new(),
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), FilterError> {
    let invalid = |reason: String| FilterError::InvalidHeader {
        name: name.to_owned(),
        reason,
    };
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
    headers.insert(header_name, header_value);
    Ok(())
}

/// 응답 헤더를 `이름 → 값 목록` 맵으로 변환합니다.
fn headers_to_value(headers: &HeaderMap) -> Value {
    let mut map = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(Value::from)
            .collect();
        map.insert(name.as_str().to_owned(), Value::List(values));
    }
    Value::Map(map)
}

impl Stage for DownloadFileStage {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn error_tag(&self) -> &str {
        ERROR_TAG
    }

    async fn process(&self, mut event: LogEvent) -> (LogEvent, bool) {
        let _timer = StageTimer::start(MODULE_NAME);

        match self.download_file(&mut event).await {
            Ok(()) => succeed(event, MODULE_NAME),
            Err(e) => {
                if e.is_retryable() {
                    event.add_tag(RETRYABLE_TAG);
                    counter!(DOWNLOAD_RETRYABLE_FAILURES_TOTAL).increment(1);
                }
                fail(event, MODULE_NAME, ERROR_TAG, &e)
            }
        }
    }
}
