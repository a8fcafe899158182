//! Syslog 분해 스테이지
//!
//! 소스 필드의 문자열을 설정된 문법([`parser::SyslogFormat`])으로 파싱하고,
//! 메시지에 있던 부분만 설정된 이벤트 필드에 기록합니다.
//! 파싱에 실패하면 어떤 출력 필드도 쓰지 않습니다.

pub mod parser;

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;

use stagehand_core::config::require_field_name;
use stagehand_core::event::LogEvent;
use stagehand_core::stage::{Stage, StageTimer, fail, succeed};

use crate::error::FilterError;

pub use parser::{SyslogFormat, SyslogMessage, SyslogParser};

/// 설정 파일의 모듈명
pub const MODULE_NAME: &str = "syslog";

/// 실패 시 추가되는 태그
pub const ERROR_TAG: &str = "stagehand_filter_syslog_error";

/// syslog 스테이지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyslogConfig {
    /// 원시 메시지를 담은 필드
    pub source: String,
    /// 문법 (`RFC5424` 또는 `RFC3164`, 대소문자 무관)
    pub format: String,
    /// 메시지 시각으로 이벤트 시각을 덮어쓸지 여부
    pub save_time: bool,
    /// 성공 시 소스 필드를 제거할지 여부
    pub remove_source: bool,
    /// 본문 출력 필드
    pub message_field: String,
    /// 호스트 이름 출력 필드
    pub hostname_field: String,
    /// 애플리케이션 이름 출력 필드
    pub app_name_field: String,
    /// severity 출력 필드
    pub severity_field: String,
    /// priority 출력 필드
    pub priority_field: String,
    /// 메시지 ID 출력 필드
    pub message_id_field: String,
    /// 프로세스 ID 출력 필드 (비어 있으면 기록하지 않음)
    pub procid_field: String,
    /// facility 출력 필드 (비어 있으면 기록하지 않음)
    pub facility_field: String,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            source: "message".to_owned(),
            format: "RFC5424".to_owned(),
            save_time: false,
            remove_source: false,
            message_field: "syslog_message".to_owned(),
            hostname_field: "hostname".to_owned(),
            app_name_field: "appname".to_owned(),
            severity_field: "severity".to_owned(),
            priority_field: "priority".to_owned(),
            message_id_field: "message_id".to_owned(),
            procid_field: String::new(),
            facility_field: String::new(),
        }
    }
}

impl SyslogConfig {
    /// 설정값의 유효성을 검증하고 문법을 해석합니다.
    pub fn validate(&self) -> Result<SyslogFormat, FilterError> {
        require_field_name("syslog.source", &self.source)?;
        for (field, value) in [
            ("syslog.message_field", &self.message_field),
            ("syslog.hostname_field", &self.hostname_field),
            ("syslog.app_name_field", &self.app_name_field),
            ("syslog.severity_field", &self.severity_field),
            ("syslog.priority_field", &self.priority_field),
            ("syslog.message_id_field", &self.message_id_field),
        ] {
            require_field_name(field, value)?;
        }
        self.format.parse()
    }
}

/// syslog 분해 스테이지
#[derive(Debug)]
pub struct SyslogStage {
    config: SyslogConfig,
    parser: SyslogParser,
}

impl SyslogStage {
    /// 설정으로 스테이지를 생성합니다. 알 수 없는 문법이면 실패합니다.
    pub fn new(config: SyslogConfig) -> Result<Self, FilterError> {
        let format = config.validate()?;
        Ok(Self {
            config,
            parser: SyslogParser::new(format),
        })
    }

    /// 스테이지가 사용하는 문법
    pub fn format(&self) -> SyslogFormat {
        self.parser.format()
    }

    /// 소스 필드를 문자열로 읽지 못한 이유
    fn source_error(&self, event: &LogEvent) -> FilterError {
        match event.get(&self.config.source) {
            Some(value) => FilterError::FieldType {
                field: self.config.source.clone(),
                expected: "string",
                found: value.type_name(),
            },
            None => FilterError::MissingField(self.config.source.clone()),
        }
    }

    /// 메시지에 있던 필드만 이벤트에 기록합니다.
    fn project(&self, message: SyslogMessage, event: &mut LogEvent) {
        let config = &self.config;

        if config.save_time {
            if let Some(ts) = message.timestamp {
                event.timestamp = SystemTime::from(ts);
            }
        }
        if let Some(body) = message.message {
            event.set(config.message_field.as_str(), body);
        }
        if let Some(hostname) = message.hostname {
            event.set(config.hostname_field.as_str(), hostname);
        }
        if let Some(appname) = message.appname {
            event.set(config.app_name_field.as_str(), appname);
        }
        if let Some(severity) = message.severity {
            event.set(config.severity_field.as_str(), i64::from(severity));
        }
        if let Some(priority) = message.priority {
            event.set(config.priority_field.as_str(), i64::from(priority));
        }
        if let Some(msgid) = message.msgid {
            event.set(config.message_id_field.as_str(), msgid);
        }
        if !config.procid_field.is_empty() {
            if let Some(procid) = message.procid {
                event.set(config.procid_field.as_str(), procid);
            }
        }
        if !config.facility_field.is_empty() {
            if let Some(facility) = message.facility {
                event.set(config.facility_field.as_str(), i64::from(facility));
            }
        }
    }
}

impl Stage for SyslogStage {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn error_tag(&self) -> &str {
        ERROR_TAG
    }

    async fn process(&self, mut event: LogEvent) -> (LogEvent, bool) {
        let _timer = StageTimer::start(MODULE_NAME);

        let Some(raw) = event.get_opt_str(&self.config.source) else {
            let err = self.source_error(&event);
            return fail(event, MODULE_NAME, ERROR_TAG, &err);
        };

        let parsed = self.parser.parse(raw.as_bytes()).and_then(|message| {
            if message.is_valid() {
                Ok(message)
            } else {
                Err(FilterError::InvalidMessage)
            }
        });

        let message = match parsed {
            Ok(message) => message,
            Err(e) => return fail(event, MODULE_NAME, ERROR_TAG, &e),
        };

        debug!(format = %self.parser.format(), "syslog message parsed");
        self.project(message, &mut event);

        if self.config.remove_source {
            event.remove(&self.config.source);
        }
        succeed(event, MODULE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::value::Value;
    use std::time::{Duration, UNIX_EPOCH};

    const RFC5424_LINE: &str =
        "<34>1 2024-01-15T12:00:00Z myhost sshd 1234 ID42 - Failed password for root";

    fn get_i64(event: &LogEvent, field: &str) -> Option<i64> {
        event.get(field).and_then(Value::as_i64)
    }

    fn stage(config: SyslogConfig) -> SyslogStage {
        SyslogStage::new(config).unwrap()
    }

    #[test]
    fn default_config_values() {
        let config = SyslogConfig::default();
        assert_eq!(config.source, "message");
        assert_eq!(config.format, "RFC5424");
        assert_eq!(config.message_field, "syslog_message");
        assert_eq!(config.hostname_field, "hostname");
        assert_eq!(config.app_name_field, "appname");
        assert_eq!(config.severity_field, "severity");
        assert_eq!(config.priority_field, "priority");
        assert_eq!(config.message_id_field, "message_id");
        assert!(!config.save_time);
        assert!(!config.remove_source);
    }

    #[test]
    fn format_is_case_insensitive() {
        let stage = stage(SyslogConfig {
            format: "rfc3164".to_owned(),
            ..Default::default()
        });
        assert_eq!(stage.format(), SyslogFormat::Rfc3164);
    }

    #[test]
    fn unknown_format_fails_construction() {
        let err = SyslogStage::new(SyslogConfig {
            format: "RFC9999".to_owned(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedFormat(_)));
    }

    #[test]
    fn empty_source_fails_construction() {
        assert!(
            SyslogStage::new(SyslogConfig {
                source: String::new(),
                ..Default::default()
            })
            .is_err()
        );
    }

    #[tokio::test]
    async fn valid_message_projects_fields() {
        let stage = stage(SyslogConfig::default());
        let (event, ok) = stage.process(LogEvent::with_message(RFC5424_LINE)).await;
        assert!(ok);
        assert_eq!(event.get_str("syslog_message"), "Failed password for root");
        assert_eq!(event.get_str("hostname"), "myhost");
        assert_eq!(event.get_str("appname"), "sshd");
        assert_eq!(event.get_str("message_id"), "ID42");
        assert_eq!(get_i64(&event, "severity"), Some(2));
        assert_eq!(get_i64(&event, "priority"), Some(34));
        assert!(event.get("facility").is_none());
        // 소스는 유지
        assert_eq!(event.get_str("message"), RFC5424_LINE);
    }

    #[tokio::test]
    async fn optional_procid_and_facility_fields() {
        let stage = stage(SyslogConfig {
            procid_field: "procid".to_owned(),
            facility_field: "facility".to_owned(),
            ..Default::default()
        });
        let (event, ok) = stage.process(LogEvent::with_message(RFC5424_LINE)).await;
        assert!(ok);
        assert_eq!(event.get_str("procid"), "1234");
        assert_eq!(get_i64(&event, "facility"), Some(4));
    }

    #[tokio::test]
    async fn nil_fields_leave_outputs_untouched() {
        let stage = stage(SyslogConfig::default());
        let mut input = LogEvent::with_message("<34>1 2024-01-15T12:00:00Z - - - - - body");
        input.set("hostname", "previous");

        let (event, ok) = stage.process(input).await;
        assert!(ok);
        assert_eq!(event.get_str("hostname"), "previous");
        assert!(event.get("appname").is_none());
        assert!(event.get("message_id").is_none());
    }

    #[tokio::test]
    async fn save_time_overwrites_timestamp() {
        let stage = stage(SyslogConfig {
            save_time: true,
            ..Default::default()
        });
        let (event, ok) = stage.process(LogEvent::with_message(RFC5424_LINE)).await;
        assert!(ok);
        assert_eq!(event.timestamp, UNIX_EPOCH + Duration::from_secs(1_705_320_000));
    }

    #[tokio::test]
    async fn timestamp_is_kept_without_save_time() {
        let stage = stage(SyslogConfig::default());
        let input = LogEvent::with_message(RFC5424_LINE);
        let before = input.timestamp;
        let (event, _) = stage.process(input).await;
        assert_eq!(event.timestamp, before);
    }

    #[tokio::test]
    async fn remove_source_on_success() {
        let stage = stage(SyslogConfig {
            remove_source: true,
            ..Default::default()
        });
        let (event, ok) = stage.process(LogEvent::with_message(RFC5424_LINE)).await;
        assert!(ok);
        assert!(!event.contains("message"));
    }

    #[tokio::test]
    async fn remove_source_keeps_source_on_failure() {
        let stage = stage(SyslogConfig {
            remove_source: true,
            ..Default::default()
        });
        let (event, ok) = stage.process(LogEvent::with_message("<34>1 truncated")).await;
        assert!(!ok);
        assert!(event.has_tag(ERROR_TAG));
        assert_eq!(event.get_str("message"), "<34>1 truncated");
    }

    #[tokio::test]
    async fn parse_failure_writes_nothing() {
        let stage = stage(SyslogConfig::default());
        let (event, ok) = stage.process(LogEvent::with_message("")).await;
        assert!(!ok);
        assert!(event.has_tag(ERROR_TAG));
        for field in ["syslog_message", "hostname", "appname", "severity", "priority"] {
            assert!(event.get(field).is_none(), "{field} should be absent");
        }
    }

    #[tokio::test]
    async fn non_string_source_is_tagged() {
        let stage = stage(SyslogConfig {
            source: "raw".to_owned(),
            ..Default::default()
        });
        let mut input = LogEvent::new();
        input.set("raw", 42i64);
        assert!(matches!(
            stage.source_error(&input),
            FilterError::FieldType { found: "integer", .. }
        ));

        let (event, ok) = stage.process(input).await;
        assert!(!ok);
        assert!(event.has_tag(ERROR_TAG));
    }

    #[test]
    fn absent_source_is_missing_field() {
        let stage = stage(SyslogConfig {
            source: "raw".to_owned(),
            ..Default::default()
        });
        assert!(matches!(
            stage.source_error(&LogEvent::new()),
            FilterError::MissingField(field) if field == "raw"
        ));
    }

    #[tokio::test]
    async fn rfc3164_message_projects_fields() {
        let stage = stage(SyslogConfig {
            source: "raw".to_owned(),
            format: "RFC3164".to_owned(),
            ..Default::default()
        });
        let mut input = LogEvent::new();
        input.set("raw", "<13>Feb  5 17:32:18 10.0.0.99 myapp[77]: Use the BFG!");
        let (event, ok) = stage.process(input).await;
        assert!(ok);
        assert_eq!(event.get_str("hostname"), "10.0.0.99");
        assert_eq!(event.get_str("appname"), "myapp");
        assert_eq!(event.get_str("syslog_message"), "Use the BFG!");
        assert_eq!(get_i64(&event, "severity"), Some(5));
        assert!(event.get("message_id").is_none());
    }
}
