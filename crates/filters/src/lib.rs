#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`hash`]: 파일을 한 번 읽어 여러 다이제스트를 계산하는 스테이지와 알고리즘 레지스트리
//! - [`auth`]: 다운로드 요청에 붙일 인증자 헤더 해석
//! - [`download`]: HTTP 다운로드 스테이지
//! - [`syslog`]: RFC 5424 / RFC 3164 파서와 필드 분해 스테이지
//! - [`delete`]: 파일 삭제 스테이지
//! - [`input`]: 디버그 파일 입력 소스와 JSON 라인 디코더
//! - [`chain`]: 스테이지를 순서대로 실행하는 체인
//! - [`config`]: TOML 설정과 체인 조립
//! - [`error`]: 도메인 에러 타입
//!
//! # 흐름
//!
//! ```text
//! DebugFileInput -> StageChain[ DownloadFile -> HashFile -> DeleteFile ] -> downstream
//!                              [ Syslog ]
//! ```

pub mod auth;
pub mod chain;
pub mod config;
pub mod delete;
pub mod download;
pub mod error;
pub mod hash;
pub mod input;
pub mod syslog;

// --- 주요 타입 re-export ---

// 설정
pub use config::StagehandConfig;

// 에러
pub use error::FilterError;

// 스테이지
pub use delete::{DeleteFileConfig, DeleteFileStage};
pub use download::{DownloadFileConfig, DownloadFileStage};
pub use hash::{HashFileConfig, HashFileStage, HashRegistry, StreamingHasher};
pub use syslog::{SyslogConfig, SyslogFormat, SyslogMessage, SyslogParser, SyslogStage};

// 인증자
pub use auth::{Authenticator, AuthenticatorSet};

// 입력
pub use input::{DebugFileConfig, DebugFileInput, JsonLinesCodec};

// 체인
pub use chain::StageChain;
