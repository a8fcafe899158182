//! Syslog 파서 (RFC 5424 / RFC 3164)
//!
//! 원시 syslog 바이트를 [`SyslogMessage`]로 분해합니다.
//! 형식은 [`SyslogFormat`]으로 고정되며, 형식 자동 감지는 하지 않습니다.
//!
//! # RFC 5424 메시지 형식
//! ```text
//! <PRI>VERSION SP TIMESTAMP SP HOSTNAME SP APP-NAME SP PROCID SP MSGID SP STRUCTURED-DATA [SP MSG]
//! ```
//! 헤더 필드는 모두 필수이며, NILVALUE (`-`)는 `None`이 됩니다.
//!
//! # RFC 3164 메시지 형식
//! ```text
//! <PRI>MMM DD HH:MM:SS SP HOSTNAME SP TAG[PID]: MSG
//! ```
//! 타임스탬프에는 연도가 없으므로 현재 연도(UTC)를 가정합니다.
//!
//! # 사용 예시
//! ```ignore
//! use stagehand_filters::syslog::parser::{SyslogFormat, SyslogParser};
//!
//! let parser = SyslogParser::new(SyslogFormat::Rfc5424);
//! let msg = parser.parse(b"<34>1 2024-01-15T12:00:00Z myhost sshd 1234 - - Failed password")?;
//! assert_eq!(msg.appname.as_deref(), Some("sshd"));
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Utc};

use crate::error::FilterError;

/// 기본 최대 입력 크기 (바이트)
pub const MAX_INPUT_SIZE: usize = 64 * 1024;

/// 유효한 최대 PRI 값 (facility 23 * 8 + severity 7)
const MAX_PRI: u8 = 191;

/// RFC 5424 헤더 필드 최대 길이
const MAX_HOSTNAME_LEN: usize = 255;
const MAX_APPNAME_LEN: usize = 48;
const MAX_PROCID_LEN: usize = 128;
const MAX_MSGID_LEN: usize = 32;
const MAX_SD_NAME_LEN: usize = 32;

const NILVALUE: &str = "-";
const UTF8_BOM: char = '\u{feff}';

/// syslog 메시지 문법
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyslogFormat {
    /// IETF syslog
    Rfc5424,
    /// BSD syslog
    Rfc3164,
}

impl SyslogFormat {
    /// 설정 파일 표기 (`"RFC5424"`, `"RFC3164"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rfc5424 => "RFC5424",
            Self::Rfc3164 => "RFC3164",
        }
    }
}

impl fmt::Display for SyslogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyslogFormat {
    type Err = FilterError;

    /// 대소문자를 구분하지 않습니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RFC5424" => Ok(Self::Rfc5424),
            "RFC3164" => Ok(Self::Rfc3164),
            _ => Err(FilterError::UnsupportedFormat(s.to_owned())),
        }
    }
}

/// 파싱된 syslog 메시지
///
/// 메시지에 없던 필드는 `None`입니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyslogMessage {
    /// PRI 값 (facility * 8 + severity)
    pub priority: Option<u8>,
    /// facility (0-23)
    pub facility: Option<u8>,
    /// severity (0-7)
    pub severity: Option<u8>,
    /// 메시지 시각
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// 호스트 이름
    pub hostname: Option<String>,
    /// 애플리케이션 이름 (RFC 3164의 TAG)
    pub appname: Option<String>,
    /// 프로세스 ID
    pub procid: Option<String>,
    /// 메시지 ID (RFC 5424 전용)
    pub msgid: Option<String>,
    /// Structured Data 파라미터 (`"{sd-id}.{param}"`, 값)
    pub structured_data: Vec<(String, String)>,
    /// 본문
    pub message: Option<String>,
}

impl SyslogMessage {
    /// PRI가 해석되었는지 여부
    ///
    /// PRI가 없으면 facility/severity도 알 수 없으므로 유효하지 않은 메시지입니다.
    pub fn is_valid(&self) -> bool {
        self.priority.is_some() && self.facility.is_some() && self.severity.is_some()
    }

    fn with_priority(pri: u8) -> Self {
        Self {
            priority: Some(pri),
            facility: Some(pri / 8),
            severity: Some(pri % 8),
            ..Default::default()
        }
    }
}

/// 형식이 고정된 syslog 파서
#[derive(Debug, Clone)]
pub struct SyslogParser {
    format: SyslogFormat,
    max_input_size: usize,
}

impl SyslogParser {
    /// 새 파서를 생성합니다.
    pub fn new(format: SyslogFormat) -> Self {
        Self {
            format,
            max_input_size: MAX_INPUT_SIZE,
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// 파서 형식
    pub fn format(&self) -> SyslogFormat {
        self.format
    }

    /// 원시 메시지를 파싱합니다.
    pub fn parse(&self, raw: &[u8]) -> Result<SyslogMessage, FilterError> {
        if raw.len() > self.max_input_size {
            return Err(self.error(
                0,
                format!(
                    "input too large: {} bytes (max: {})",
                    raw.len(),
                    self.max_input_size
                ),
            ));
        }

        let input = String::from_utf8_lossy(raw);
        let input = input.trim_end_matches(['\r', '\n']);
        if input.trim().is_empty() {
            return Err(self.error(0, "empty input".to_owned()));
        }

        let mut cursor = Cursor::new(input, self.format);
        let pri = cursor.priority()?;
        let mut message = SyslogMessage::with_priority(pri);

        match self.format {
            SyslogFormat::Rfc5424 => parse_rfc5424(&mut cursor, &mut message)?,
            SyslogFormat::Rfc3164 => parse_rfc3164(&mut cursor, &mut message)?,
        }

        Ok(message)
    }

    fn error(&self, offset: usize, reason: String) -> FilterError {
        FilterError::Parse {
            format: self.format.as_str().to_owned(),
            offset,
            reason,
        }
    }
}

// ─── RFC 5424 ───────────────────────────────────────────────────────

fn parse_rfc5424(cursor: &mut Cursor<'_>, message: &mut SyslogMessage) -> Result<(), FilterError> {
    let version = cursor.token("VERSION")?;
    if version.len() > 3
        || version.starts_with('0')
        || !version.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(cursor.error_at(
            cursor.pos - version.len(),
            format!("invalid VERSION '{version}'"),
        ));
    }

    cursor.space("TIMESTAMP")?;
    let timestamp = cursor.token("TIMESTAMP")?;
    if timestamp != NILVALUE {
        let parsed = DateTime::parse_from_rfc3339(timestamp).map_err(|e| {
            cursor.error_at(
                cursor.pos - timestamp.len(),
                format!("invalid RFC 3339 timestamp '{timestamp}': {e}"),
            )
        })?;
        message.timestamp = Some(parsed);
    }

    cursor.space("HOSTNAME")?;
    message.hostname = cursor.header_field("HOSTNAME", MAX_HOSTNAME_LEN)?;
    cursor.space("APP-NAME")?;
    message.appname = cursor.header_field("APP-NAME", MAX_APPNAME_LEN)?;
    cursor.space("PROCID")?;
    message.procid = cursor.header_field("PROCID", MAX_PROCID_LEN)?;
    cursor.space("MSGID")?;
    message.msgid = cursor.header_field("MSGID", MAX_MSGID_LEN)?;
    cursor.space("STRUCTURED-DATA")?;
    message.structured_data = cursor.structured_data()?;

    if cursor.is_at_end() {
        return Ok(());
    }
    cursor.space("MSG")?;
    let body = cursor.rest();
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    if !body.is_empty() {
        message.message = Some(body.to_owned());
    }
    Ok(())
}

// ─── RFC 3164 ───────────────────────────────────────────────────────

fn parse_rfc3164(cursor: &mut Cursor<'_>, message: &mut SyslogMessage) -> Result<(), FilterError> {
    let start = cursor.pos;
    let month = cursor.token("TIMESTAMP")?;
    cursor.spaces();
    let day = cursor.token("TIMESTAMP")?;
    cursor.space("TIMESTAMP")?;
    let time = cursor.token("TIMESTAMP")?;

    let naive = parse_bsd_timestamp(month, day, time, Utc::now().year()).map_err(|e| {
        cursor.error_at(
            start,
            format!("invalid BSD timestamp '{month} {day} {time}': {e}"),
        )
    })?;
    message.timestamp = Some(naive.and_utc().fixed_offset());

    cursor.space("HOSTNAME")?;
    message.hostname = Some(cursor.token("HOSTNAME")?.to_owned());

    if cursor.is_at_end() {
        return Ok(());
    }
    cursor.space("MSG")?;
    let rest = cursor.rest();

    let (tag, procid, body) = split_tag(rest);
    message.appname = tag.map(str::to_owned);
    message.procid = procid.map(str::to_owned);
    if !body.is_empty() {
        message.message = Some(body.to_owned());
    }
    Ok(())
}

/// 연도가 없는 BSD 시각을 `year` 기준으로 해석합니다.
///
/// 해당 연도에 없는 날짜(평년의 2월 29일)는 직전 4년 안의 연도로 다시 시도합니다.
fn parse_bsd_timestamp(
    month: &str,
    day: &str,
    time: &str,
    year: i32,
) -> Result<NaiveDateTime, chrono::ParseError> {
    let parse = |year: i32| {
        NaiveDateTime::parse_from_str(&format!("{year} {month} {day} {time}"), "%Y %b %d %H:%M:%S")
    };
    let first = parse(year);
    if first.is_ok() {
        return first;
    }
    (1..=4)
        .map(|back| parse(year - back))
        .find(Result::is_ok)
        .unwrap_or(first)
}

/// `TAG[PID]: MSG`를 분리합니다.
///
/// TAG 뒤에 `[` 또는 `:`가 오지 않으면 전체를 본문으로 봅니다.
fn split_tag(rest: &str) -> (Option<&str>, Option<&str>, &str) {
    let Some(end) = rest.find(['[', ':', ' ']) else {
        return (None, None, rest);
    };
    let tag = &rest[..end];
    if tag.is_empty() {
        return (None, None, rest);
    }

    let after_tag = &rest[end..];
    let (procid, after_pid) = if let Some(pid_part) = after_tag.strip_prefix('[') {
        match pid_part.find(']') {
            Some(close) => (Some(&pid_part[..close]), &pid_part[close + 1..]),
            None => return (None, None, rest),
        }
    } else {
        (None, after_tag)
    };

    match after_pid.strip_prefix(':') {
        Some(body) => (Some(tag), procid, body.strip_prefix(' ').unwrap_or(body)),
        None if procid.is_some() => (Some(tag), procid, after_pid.trim_start()),
        None => (None, None, rest),
    }
}

// ─── 커서 ───────────────────────────────────────────────────────────

/// 바이트 오프셋을 추적하는 입력 커서
///
/// 구분자는 모두 ASCII이므로 구분자 위치에서 자르는 슬라이스는
/// 항상 UTF-8 경계에 놓입니다.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    format: SyslogFormat,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, format: SyslogFormat) -> Self {
        Self {
            input,
            pos: 0,
            format,
        }
    }

    fn error_at(&self, offset: usize, reason: String) -> FilterError {
        FilterError::Parse {
            format: self.format.as_str().to_owned(),
            offset,
            reason,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// `<PRI>`를 읽습니다.
    fn priority(&mut self) -> Result<u8, FilterError> {
        if self.peek() != Some(b'<') {
            return Err(self.error_at(self.pos, "missing PRI field (expected '<')".to_owned()));
        }
        self.pos += 1;

        let digits_start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = &self.input[digits_start..self.pos];

        if self.peek() != Some(b'>') {
            return Err(self.error_at(self.pos, "unterminated PRI field".to_owned()));
        }
        if digits.is_empty() || digits.len() > 3 || (digits.len() > 1 && digits.starts_with('0')) {
            return Err(self.error_at(digits_start, format!("invalid PRI value '{digits}'")));
        }

        let pri: u8 = digits
            .parse()
            .map_err(|_| self.error_at(digits_start, format!("invalid PRI value '{digits}'")))?;
        if pri > MAX_PRI {
            return Err(self.error_at(
                digits_start,
                format!("PRI value {pri} out of valid range (0-{MAX_PRI})"),
            ));
        }

        self.pos += 1;
        Ok(pri)
    }

    /// 공백 하나를 요구합니다.
    fn space(&mut self, next_field: &str) -> Result<(), FilterError> {
        if self.peek() != Some(b' ') {
            return Err(self.error_at(
                self.pos,
                format!("expected space before {next_field}"),
            ));
        }
        self.pos += 1;
        Ok(())
    }

    /// 연속된 공백을 건너뜁니다.
    fn spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// 다음 공백 전까지의 비어 있지 않은 토큰을 읽습니다.
    fn token(&mut self, field: &str) -> Result<&'a str, FilterError> {
        let start = self.pos;
        let end = self.rest().find(' ').map_or(self.input.len(), |i| start + i);
        if end == start {
            return Err(self.error_at(start, format!("missing {field}")));
        }
        self.pos = end;
        Ok(&self.input[start..end])
    }

    /// NILVALUE를 허용하는 길이 제한 헤더 필드
    fn header_field(&mut self, field: &str, max_len: usize) -> Result<Option<String>, FilterError> {
        let value = self.token(field)?;
        if value == NILVALUE {
            return Ok(None);
        }
        if value.chars().count() > max_len {
            return Err(self.error_at(
                self.pos - value.len(),
                format!("{field} longer than {max_len} characters"),
            ));
        }
        Ok(Some(value.to_owned()))
    }

    /// `-` 또는 하나 이상의 `[SD-ID PARAM="VALUE"...]` 요소
    fn structured_data(&mut self) -> Result<Vec<(String, String)>, FilterError> {
        if self.peek() == Some(b'-') {
            self.pos += 1;
            return Ok(Vec::new());
        }
        if self.peek() != Some(b'[') {
            return Err(self.error_at(self.pos, "missing STRUCTURED-DATA".to_owned()));
        }

        let mut params = Vec::new();
        while self.peek() == Some(b'[') {
            self.pos += 1;
            let id = self.sd_name("SD-ID")?;
            loop {
                match self.peek() {
                    Some(b']') => {
                        self.pos += 1;
                        break;
                    }
                    Some(b' ') => {
                        self.pos += 1;
                        let name = self.sd_name("PARAM-NAME")?;
                        if self.peek() != Some(b'=') {
                            return Err(self.error_at(self.pos, "expected '=' after PARAM-NAME".to_owned()));
                        }
                        self.pos += 1;
                        let value = self.sd_value()?;
                        params.push((format!("{id}.{name}"), value));
                    }
                    _ => {
                        return Err(self.error_at(self.pos, "unterminated SD-ELEMENT".to_owned()));
                    }
                }
            }
        }
        Ok(params)
    }

    /// SD-ID / PARAM-NAME: `=`, 공백, `]`, `"`를 제외한 출력 가능 ASCII
    fn sd_name(&mut self, field: &str) -> Result<&'a str, FilterError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_graphic() && !matches!(b, b'=' | b']' | b'"'))
        {
            self.pos += 1;
        }
        let name = &self.input[start..self.pos];
        if name.is_empty() || name.len() > MAX_SD_NAME_LEN {
            return Err(self.error_at(start, format!("invalid {field} '{name}'")));
        }
        Ok(name)
    }

    /// 따옴표로 감싼 PARAM-VALUE (`\"`, `\\`, `\]` 이스케이프)
    fn sd_value(&mut self) -> Result<String, FilterError> {
        if self.peek() != Some(b'"') {
            return Err(self.error_at(self.pos, "SD-PARAM value must be quoted".to_owned()));
        }
        self.pos += 1;

        let mut value = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((idx, ch)) = chars.next() {
            match ch {
                '"' => {
                    self.pos += idx + 1;
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, escaped @ ('"' | '\\' | ']'))) => value.push(escaped),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                other => value.push(other),
            }
        }
        Err(self.error_at(self.pos, "unterminated SD-PARAM value".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rfc5424() -> SyslogParser {
        SyslogParser::new(SyslogFormat::Rfc5424)
    }

    fn rfc3164() -> SyslogParser {
        SyslogParser::new(SyslogFormat::Rfc3164)
    }

    #[test]
    fn format_from_str_is_case_insensitive() {
        assert_eq!("rfc5424".parse::<SyslogFormat>().unwrap(), SyslogFormat::Rfc5424);
        assert_eq!("RFC3164".parse::<SyslogFormat>().unwrap(), SyslogFormat::Rfc3164);
        assert_eq!("Rfc3164".parse::<SyslogFormat>().unwrap(), SyslogFormat::Rfc3164);
    }

    #[test]
    fn format_from_str_rejects_unknown() {
        let err = "RFC9999".parse::<SyslogFormat>().unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedFormat(ref f) if f == "RFC9999"));
    }

    #[test]
    fn parse_rfc5424_basic() {
        let msg = rfc5424()
            .parse(b"<34>1 2024-01-15T12:00:00Z myhost sshd 1234 - - Failed password for root")
            .unwrap();
        assert!(msg.is_valid());
        assert_eq!(msg.priority, Some(34));
        assert_eq!(msg.facility, Some(4));
        assert_eq!(msg.severity, Some(2));
        assert_eq!(msg.hostname.as_deref(), Some("myhost"));
        assert_eq!(msg.appname.as_deref(), Some("sshd"));
        assert_eq!(msg.procid.as_deref(), Some("1234"));
        assert!(msg.msgid.is_none());
        assert_eq!(msg.message.as_deref(), Some("Failed password for root"));
        assert_eq!(
            msg.timestamp.unwrap().to_rfc3339(),
            "2024-01-15T12:00:00+00:00"
        );
    }

    #[test]
    fn parse_rfc5424_nilvalue_fields() {
        let msg = rfc5424()
            .parse(b"<34>1 2024-01-15T12:00:00Z - - - - - Message only")
            .unwrap();
        assert!(msg.hostname.is_none());
        assert!(msg.appname.is_none());
        assert!(msg.procid.is_none());
        assert!(msg.msgid.is_none());
        assert_eq!(msg.message.as_deref(), Some("Message only"));
    }

    #[test]
    fn parse_rfc5424_nil_timestamp() {
        let msg = rfc5424().parse(b"<13>1 - host app - ID7 -").unwrap();
        assert!(msg.timestamp.is_none());
        assert_eq!(msg.msgid.as_deref(), Some("ID7"));
        assert!(msg.message.is_none());
    }

    #[test]
    fn parse_rfc5424_with_timezone_and_fraction() {
        let msg = rfc5424()
            .parse(b"<165>1 2003-10-11T22:14:15.003-07:00 host app - - - msg")
            .unwrap();
        let ts = msg.timestamp.unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -7 * 3600);
        assert_eq!(ts.timestamp_subsec_millis(), 3);
    }

    #[test]
    fn parse_rfc5424_structured_data() {
        let msg = rfc5424()
            .parse(
                b"<165>1 2003-10-11T22:14:15.003Z mymachine.example.com evntslog - ID47 \
                  [exampleSDID@32473 iut=\"3\" eventSource=\"Application\"][meta user=\"admin\"] \
                  An application event",
            )
            .unwrap();
        assert_eq!(
            msg.structured_data,
            vec![
                ("exampleSDID@32473.iut".to_owned(), "3".to_owned()),
                (
                    "exampleSDID@32473.eventSource".to_owned(),
                    "Application".to_owned()
                ),
                ("meta.user".to_owned(), "admin".to_owned()),
            ]
        );
        assert_eq!(msg.message.as_deref(), Some("An application event"));
    }

    #[test]
    fn parse_structured_data_escapes() {
        let msg = rfc5424()
            .parse(br#"<34>1 2024-01-15T12:00:00Z host app - - [test k="a\"b\]c\\d\x" eq="v=1"] m"#)
            .unwrap();
        assert_eq!(msg.structured_data[0].1, r#"a"b]c\d\x"#);
        assert_eq!(msg.structured_data[1].1, "v=1");
    }

    #[test]
    fn parse_structured_data_empty_value() {
        let msg = rfc5424()
            .parse(br#"<34>1 2024-01-15T12:00:00Z host app - - [test key=""] msg"#)
            .unwrap();
        assert_eq!(msg.structured_data, vec![("test.key".to_owned(), String::new())]);
    }

    #[test]
    fn parse_structured_data_unclosed_fails() {
        let result =
            rfc5424().parse(br#"<34>1 2024-01-15T12:00:00Z host app - - [test foo="bar" message"#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_strips_bom_from_message() {
        let raw = "<34>1 2024-01-15T12:00:00Z host app - - - \u{feff}hello";
        let msg = rfc5424().parse(raw.as_bytes()).unwrap();
        assert_eq!(msg.message.as_deref(), Some("hello"));
    }

    #[test]
    fn parse_unicode_message() {
        let raw = "<34>1 2024-01-15T12:00:00Z host app - - - Hello 世界 🌍";
        let msg = rfc5424().parse(raw.as_bytes()).unwrap();
        assert_eq!(msg.message.as_deref(), Some("Hello 世界 🌍"));
    }

    #[test]
    fn parse_trailing_newline_is_ignored() {
        let msg = rfc5424()
            .parse(b"<34>1 2024-01-15T12:00:00Z host app - - - msg\n")
            .unwrap();
        assert_eq!(msg.message.as_deref(), Some("msg"));
    }

    #[test]
    fn parse_empty_input_fails() {
        assert!(rfc5424().parse(b"").is_err());
        assert!(rfc5424().parse(b"   ").is_err());
        assert!(rfc3164().parse(b"").is_err());
    }

    #[test]
    fn parse_truncated_message_fails() {
        assert!(rfc5424().parse(b"<34").is_err());
        assert!(rfc5424().parse(b"<34>1 2024-01-15T12:00:00Z").is_err());
        assert!(rfc5424().parse(b"<34>1 2024-01-15T12:00:00Z host app").is_err());
    }

    #[test]
    fn parse_missing_pri_fails() {
        let err = rfc5424().parse(b"1 2024-01-15T12:00:00Z host app - - - msg").unwrap_err();
        assert!(err.to_string().contains("PRI"));
    }

    #[test]
    fn parse_pri_boundaries() {
        assert!(rfc5424().parse(b"<191>1 - host app - - - msg").is_ok());
        assert!(rfc5424().parse(b"<192>1 - host app - - - msg").is_err());
        assert!(rfc5424().parse(b"<999>1 - host app - - - msg").is_err());
        assert!(rfc5424().parse(b"<-1>1 - host app - - - msg").is_err());
        assert!(rfc5424().parse(b"<034>1 - host app - - - msg").is_err());
        assert!(rfc5424().parse(b"<0>1 - host app - - - msg").is_ok());
    }

    #[test]
    fn parse_invalid_version_fails() {
        assert!(rfc5424().parse(b"<34>0 - host app - - - msg").is_err());
        assert!(rfc5424().parse(b"<34>x - host app - - - msg").is_err());
    }

    #[test]
    fn parse_malformed_timestamp_fails() {
        let err = rfc5424()
            .parse(b"<34>1 not-a-timestamp host app - - - msg")
            .unwrap_err();
        assert!(matches!(err, FilterError::Parse { offset: 6, .. }));
    }

    #[test]
    fn parse_double_space_fails() {
        assert!(
            rfc5424()
                .parse(b"<34>1  2024-01-15T12:00:00Z  host  app  -  -  -  msg")
                .is_err()
        );
    }

    #[test]
    fn parse_overlong_appname_fails() {
        let raw = format!("<34>1 - host {} - - - msg", "a".repeat(49));
        assert!(rfc5424().parse(raw.as_bytes()).is_err());
    }

    #[test]
    fn parse_too_large_input_fails() {
        let parser = rfc5424().with_max_input_size(10);
        let err = parser.parse(b"<34>1 - host app - - - message").unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn default_limit_is_64k() {
        let raw = format!("<34>1 - host app - - - {}", "x".repeat(MAX_INPUT_SIZE));
        assert!(rfc5424().parse(raw.as_bytes()).is_err());
    }

    #[test]
    fn parse_rfc3164_basic() {
        let msg = rfc3164()
            .parse(b"<34>Jan 15 12:00:00 myhost sshd: Failed password")
            .unwrap();
        assert!(msg.is_valid());
        assert_eq!(msg.hostname.as_deref(), Some("myhost"));
        assert_eq!(msg.appname.as_deref(), Some("sshd"));
        assert!(msg.procid.is_none());
        assert_eq!(msg.message.as_deref(), Some("Failed password"));
        let ts = msg.timestamp.unwrap();
        assert_eq!(ts.year(), Utc::now().year());
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 15);
    }

    #[test]
    fn parse_rfc3164_with_pid() {
        let msg = rfc3164()
            .parse(b"<34>Jan 15 12:00:00 host sshd[1234]: Connection closed")
            .unwrap();
        assert_eq!(msg.appname.as_deref(), Some("sshd"));
        assert_eq!(msg.procid.as_deref(), Some("1234"));
        assert_eq!(msg.message.as_deref(), Some("Connection closed"));
    }

    #[test]
    fn parse_rfc3164_space_padded_day() {
        let msg = rfc3164().parse(b"<13>Feb  5 17:32:18 host app: hi").unwrap();
        assert_eq!(msg.timestamp.unwrap().day(), 5);
        assert_eq!(msg.hostname.as_deref(), Some("host"));
    }

    #[test]
    fn parse_rfc3164_without_tag() {
        let msg = rfc3164()
            .parse(b"<34>Jan 15 12:00:00 host app message without colon")
            .unwrap();
        assert!(msg.appname.is_none());
        assert_eq!(msg.message.as_deref(), Some("app message without colon"));
    }

    #[test]
    fn parse_rfc3164_leap_day_outside_leap_year() {
        let msg = rfc3164().parse(b"<34>Feb 29 12:00:00 host app: x").unwrap();
        let ts = msg.timestamp.unwrap();
        assert_eq!((ts.month(), ts.day()), (2, 29));
        assert_eq!(msg.hostname.as_deref(), Some("host"));
    }

    #[test]
    fn bsd_timestamp_year_fallback() {
        let ts = parse_bsd_timestamp("Feb", "29", "12:00:00", 2025).unwrap();
        assert_eq!(ts.year(), 2024);
        let ts = parse_bsd_timestamp("Mar", "1", "00:00:00", 2025).unwrap();
        assert_eq!(ts.year(), 2025);
        assert!(parse_bsd_timestamp("Feb", "30", "12:00:00", 2025).is_err());
    }

    #[test]
    fn parse_rfc3164_requires_timestamp() {
        assert!(rfc3164().parse(b"<34>Foo 15 12:00:00 host app: msg").is_err());
        assert!(rfc3164().parse(b"<34>Jan 99 12:00:00 host app: msg").is_err());
        assert!(rfc3164().parse(b"<34>host app: msg").is_err());
    }

    #[test]
    fn split_tag_cases() {
        assert_eq!(split_tag("su: failed"), (Some("su"), None, "failed"));
        assert_eq!(split_tag("cron[42]: run"), (Some("cron"), Some("42"), "run"));
        assert_eq!(split_tag("cron[42] run"), (Some("cron"), Some("42"), "run"));
        assert_eq!(split_tag("plain text"), (None, None, "plain text"));
        assert_eq!(split_tag("broken[42 x"), (None, None, "broken[42 x"));
    }
}
