//! 스테이지 체인
//!
//! 여러 스테이지를 순서대로 실행하며 이벤트를 다음 스테이지로 넘깁니다.
//! 한 스테이지가 실패해도 이후 스테이지는 계속 실행되며, 결과는 모든 성공 여부의 AND입니다.

use stagehand_core::event::LogEvent;
use stagehand_core::stage::DynStage;

/// 순서가 있는 스테이지 목록
#[derive(Default)]
pub struct StageChain {
    stages: Vec<Box<dyn DynStage>>,
}

impl StageChain {
    /// 빈 체인을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스테이지를 뒤에 추가합니다.
    pub fn push(mut self, stage: impl DynStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// 박스된 스테이지를 뒤에 추가합니다.
    pub fn push_boxed(&mut self, stage: Box<dyn DynStage>) {
        self.stages.push(stage);
    }

    /// 스테이지 이름 (실행 순서)
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// 스테이지 수
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// 모든 스테이지에 이벤트를 통과시킵니다.
    pub async fn run(&self, mut event: LogEvent) -> (LogEvent, bool) {
        let mut all_ok = true;
        for stage in &self.stages {
            let (next, ok) = stage.process(event).await;
            if !ok {
                tracing::debug!(stage = stage.name(), "stage reported failure, continuing chain");
            }
            event = next;
            all_ok &= ok;
        }
        (event, all_ok)
    }
}

impl std::fmt::Debug for StageChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageChain")
            .field("stages", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::stage::{Stage, fail, succeed};

    struct SetField(&'static str);

    impl Stage for SetField {
        fn name(&self) -> &str {
            self.0
        }

        fn error_tag(&self) -> &str {
            "set_error"
        }

        async fn process(&self, mut event: LogEvent) -> (LogEvent, bool) {
            event.set(self.0, "done");
            succeed(event, self.0)
        }
    }

    struct AlwaysFail;

    impl Stage for AlwaysFail {
        fn name(&self) -> &str {
            "fail"
        }

        fn error_tag(&self) -> &str {
            "always_fail_error"
        }

        async fn process(&self, event: LogEvent) -> (LogEvent, bool) {
            fail(event, "fail", "always_fail_error", &"nope")
        }
    }

    #[tokio::test]
    async fn empty_chain_passes_event_through() {
        let chain = StageChain::new();
        assert!(chain.is_empty());
        let (event, ok) = chain.run(LogEvent::with_message("x")).await;
        assert!(ok);
        assert_eq!(event.get_str("message"), "x");
    }

    #[tokio::test]
    async fn runs_stages_in_order() {
        let chain = StageChain::new().push(SetField("a")).push(SetField("b"));
        assert_eq!(chain.names(), vec!["a", "b"]);
        let (event, ok) = chain.run(LogEvent::new()).await;
        assert!(ok);
        assert_eq!(event.get_str("a"), "done");
        assert_eq!(event.get_str("b"), "done");
    }

    #[tokio::test]
    async fn failure_does_not_stop_later_stages() {
        let chain = StageChain::new()
            .push(SetField("a"))
            .push(AlwaysFail)
            .push(SetField("b"));
        let (event, ok) = chain.run(LogEvent::new()).await;
        assert!(!ok);
        assert!(event.has_tag("always_fail_error"));
        assert_eq!(event.get_str("b"), "done");
    }
}
