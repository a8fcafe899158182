#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod metrics;
pub mod stage;
pub mod value;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, StageError, StagehandError};

// 설정
pub use config::GeneralConfig;

// 이벤트
pub use event::{LogEvent, MESSAGE_FIELD};
pub use value::Value;

// 스테이지 trait
pub use stage::{BoxFuture, DynStage, Stage, StageTimer};
