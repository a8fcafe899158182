//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 스테이지는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `stagehand_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(
//!     stagehand_core::metrics::STAGE_EVENTS_TOTAL,
//!     stagehand_core::metrics::LABEL_STAGE => "hashfile",
//!     stagehand_core::metrics::LABEL_RESULT => stagehand_core::metrics::RESULT_SUCCESS,
//! )
//! .increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 스테이지 이름 레이블 키 (hashfile, downloadfile, syslog, deletefile)
pub const LABEL_STAGE: &str = "stage";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 해시 알고리즘 레이블 키
pub const LABEL_ALGORITHM: &str = "algorithm";

/// 성공 결과 레이블 값
pub const RESULT_SUCCESS: &str = "success";

/// 실패 결과 레이블 값
pub const RESULT_FAILURE: &str = "failure";

// ─── 스테이지 메트릭 ───────────────────────────────────────────────

/// 스테이지: 처리된 이벤트 수 (counter, labels: stage, result)
pub const STAGE_EVENTS_TOTAL: &str = "stagehand_stage_events_total";

/// 스테이지: 이벤트 처리 지연 시간 (histogram, 초, label: stage)
pub const STAGE_PROCESSING_DURATION_SECONDS: &str = "stagehand_stage_processing_duration_seconds";

/// Download: 저장된 바이트 수 (counter)
pub const DOWNLOAD_BYTES_TOTAL: &str = "stagehand_download_bytes_total";

/// Download: 재시도 가능 상태 코드로 실패한 요청 수 (counter)
pub const DOWNLOAD_RETRYABLE_FAILURES_TOTAL: &str = "stagehand_download_retryable_failures_total";

/// Hash: 해시한 바이트 수 (counter, label: algorithm)
pub const HASH_BYTES_TOTAL: &str = "stagehand_hash_bytes_total";

/// Input: 입력 소스가 생성한 이벤트 수 (counter)
pub const INPUT_EVENTS_TOTAL: &str = "stagehand_input_events_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        STAGE_EVENTS_TOTAL,
        "Total number of events processed by a stage, by result"
    );
    describe_histogram!(
        STAGE_PROCESSING_DURATION_SECONDS,
        "Time to process a single event in a stage in seconds"
    );
    describe_counter!(
        DOWNLOAD_BYTES_TOTAL,
        "Total bytes written to disk by the download stage"
    );
    describe_counter!(
        DOWNLOAD_RETRYABLE_FAILURES_TOTAL,
        "Total number of downloads that failed with a retryable status code"
    );
    describe_counter!(
        HASH_BYTES_TOTAL,
        "Total bytes digested by the hash stage, by algorithm"
    );
    describe_counter!(
        INPUT_EVENTS_TOTAL,
        "Total number of events emitted by input sources"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        STAGE_EVENTS_TOTAL,
        STAGE_PROCESSING_DURATION_SECONDS,
        DOWNLOAD_BYTES_TOTAL,
        DOWNLOAD_RETRYABLE_FAILURES_TOTAL,
        HASH_BYTES_TOTAL,
        INPUT_EVENTS_TOTAL,
    ];

    #[test]
    fn all_metrics_start_with_stagehand_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("stagehand_"),
                "Metric '{}' does not start with 'stagehand_' prefix",
                name
            );
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더 없이도 패닉하지 않아야 함
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_STAGE, LABEL_RESULT, LABEL_ALGORITHM] {
            assert_eq!(label.to_lowercase(), label);
        }
    }
}
