//! 다운로드 인증자(authenticator) 해석
//!
//! 인증자는 이름이 붙은 추가 헤더 묶음이며, `restrict_to`에 나열된 호스트로
//! 가는 요청에만 적용됩니다. `restrict_to`가 비어 있으면 어떤 호스트와도
//! 일치하지 않습니다.
//!
//! # 로딩 순서
//! 아래 출처를 순서대로 이어 붙이며, 조회 시 먼저 로드된 항목이 우선합니다.
//! 1. 설정에 직접 적은 목록
//! 2. 설정의 `authenticator_file`
//! 3. 환경변수 `FILTERDOWNLOAD_AUTHENTICATOR`가 가리키는 파일
//! 4. 작업 디렉토리의 `authenticator.json`
//!
//! 파일이 없거나 형식이 잘못되어도 스테이지 초기화는 실패하지 않습니다.
//! 해당 파일은 항목을 하나도 기여하지 않으며, 로그만 남깁니다.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FilterError;

/// 인증자 파일 경로를 지정하는 환경변수
pub const AUTHENTICATOR_ENV: &str = "FILTERDOWNLOAD_AUTHENTICATOR";

/// 작업 디렉토리에서 찾는 기본 인증자 파일
pub const DEFAULT_AUTHENTICATOR_FILE: &str = "authenticator.json";

/// 이름이 붙은 요청 헤더 묶음
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticator {
    /// 인증자 이름
    pub name: String,
    /// 요청에 추가할 헤더
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// 적용 가능한 호스트 이름
    #[serde(default)]
    pub restrict_to: Vec<String>,
}

impl Authenticator {
    /// 이름과 호스트가 모두 일치하는지 확인합니다.
    pub fn matches(&self, name: &str, host: &str) -> bool {
        self.name == name && self.restrict_to.iter().any(|h| h == host)
    }
}

/// 로드 순서를 유지하는 인증자 목록
///
/// 스테이지 초기화 시 한 번 만들어지고 이후에는 읽기 전용입니다.
#[derive(Debug, Clone, Default)]
pub struct AuthenticatorSet {
    entries: Vec<Authenticator>,
}

impl AuthenticatorSet {
    /// 주어진 목록으로 생성합니다.
    pub fn new(entries: Vec<Authenticator>) -> Self {
        Self { entries }
    }

    /// 모든 출처에서 인증자를 로드합니다.
    pub async fn load(inline: Vec<Authenticator>, file: Option<&Path>) -> Self {
        let mut set = Self::new(inline);

        if let Some(path) = file {
            set.extend_from_file(path).await;
        }

        if let Ok(path) = std::env::var(AUTHENTICATOR_ENV) {
            if !path.is_empty() {
                set.extend_from_file(Path::new(&path)).await;
            }
        }

        set.extend_from_file(Path::new(DEFAULT_AUTHENTICATOR_FILE))
            .await;

        debug!(count = set.len(), "authenticators loaded");
        set
    }

    /// 파일의 인증자를 뒤에 추가하고, 추가된 개수를 반환합니다.
    ///
    /// 파일이 없으면 debug, 형식이 잘못되었으면 warn 로그를 남기고 0을 반환합니다.
    pub async fn extend_from_file(&mut self, path: &Path) -> usize {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "authenticator file not readable");
                return 0;
            }
        };

        match parse_authenticators(&bytes) {
            Ok(entries) => {
                let count = entries.len();
                self.entries.extend(entries);
                count
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed authenticator file, ignoring");
                0
            }
        }
    }

    /// 이름과 호스트가 일치하는 첫 인증자의 헤더를 반환합니다.
    ///
    /// 일치하는 항목이 없으면 빈 맵입니다.
    pub fn headers_for(&self, name: &str, host: &str) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .find(|auth| auth.matches(name, host))
            .map(|auth| auth.headers.clone())
            .unwrap_or_default()
    }

    /// 인증자 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 로드된 인증자 (로드 순서)
    pub fn entries(&self) -> &[Authenticator] {
        &self.entries
    }
}

/// JSON 배열 형식의 인증자 목록을 파싱합니다.
pub fn parse_authenticators(bytes: &[u8]) -> Result<Vec<Authenticator>, FilterError> {
    Ok(serde_json::from_slice(bytes)?)
}
