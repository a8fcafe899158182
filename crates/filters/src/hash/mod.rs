//! 파일 해시 스테이지
//!
//! 이벤트 필드가 가리키는 파일을 한 번만 읽으면서 설정된 모든 알고리즘의
//! 다이제스트를 동시에 계산하고, `알고리즘 이름 → 다이제스트 바이트` 맵을
//! 출력 필드에 기록합니다.
//!
//! 파일은 `buf_size` 크기의 청크로 읽으며, 각 청크는 다음 읽기 전에 모든
//! 누산기에 전달됩니다. 결과는 파일 내용에만 의존하고 버퍼 크기와는 무관합니다.

pub mod registry;

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tracing::debug;

use stagehand_core::config::require_field_name;
use stagehand_core::event::LogEvent;
use stagehand_core::metrics::{HASH_BYTES_TOTAL, LABEL_ALGORITHM};
use stagehand_core::stage::{Stage, StageTimer, fail, succeed};
use stagehand_core::value::Value;

use crate::error::FilterError;

pub use registry::{HashRegistry, HasherFactory, StreamingHasher};

/// 설정 파일의 모듈명
pub const MODULE_NAME: &str = "hashfile";

/// 실패 시 추가되는 태그
pub const ERROR_TAG: &str = "stagehand_filter_hashfile_error";

/// 기본 읽기 버퍼 크기 (바이트)
pub const DEFAULT_BUF_SIZE: usize = 20_000;

/// 해시 스테이지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashFileConfig {
    /// 파일 경로를 담은 이벤트 필드
    pub field: String,
    /// 결과 맵을 기록할 이벤트 필드
    pub output: String,
    /// 계산할 알고리즘 (비어 있으면 등록된 전체)
    pub algos: Vec<String>,
    /// 읽기 버퍼 크기 (1 미만이면 기본값)
    pub buf_size: i64,
}

impl Default for HashFileConfig {
    fn default() -> Self {
        Self {
            field: "file_name".to_owned(),
            output: "hash".to_owned(),
            algos: Vec::new(),
            buf_size: DEFAULT_BUF_SIZE as i64,
        }
    }
}

/// 파일 해시 스테이지
#[derive(Debug)]
pub struct HashFileStage {
    field: String,
    output: String,
    algos: Vec<String>,
    buf_size: usize,
    registry: Arc<HashRegistry>,
}

impl HashFileStage {
    /// 설정과 레지스트리로 스테이지를 생성합니다.
    ///
    /// 레지스트리에 없는 알고리즘이 하나라도 있으면 실패합니다.
    pub fn new(config: HashFileConfig, registry: Arc<HashRegistry>) -> Result<Self, FilterError> {
        require_field_name("hashfile.field", &config.field)?;
        require_field_name("hashfile.output", &config.output)?;

        let algos = if config.algos.is_empty() {
            registry.names().into_iter().map(str::to_owned).collect()
        } else {
            config.algos
        };

        if let Some(unknown) = algos.iter().find(|name| !registry.contains(name)) {
            return Err(FilterError::UnsupportedAlgorithm(unknown.clone()));
        }

        let buf_size = usize::try_from(config.buf_size)
            .ok()
            .filter(|size| *size >= 1)
            .unwrap_or(DEFAULT_BUF_SIZE);

        Ok(Self {
            field: config.field,
            output: config.output,
            algos,
            buf_size,
            registry,
        })
    }

    /// 계산할 알고리즘 목록
    pub fn algorithms(&self) -> &[String] {
        &self.algos
    }

    /// 실제 적용된 버퍼 크기
    pub fn buf_size(&self) -> usize {
        self.buf_size
    }

    /// 파일 하나를 읽어 모든 알고리즘의 다이제스트를 계산합니다.
    pub async fn hash_file(&self, path: &Path) -> Result<BTreeMap<String, Value>, FilterError> {
        let mut hashers = self
            .algos
            .iter()
            .map(|name| {
                self.registry
                    .create(name)
                    .map(|hasher| (name.clone(), hasher))
                    .ok_or_else(|| FilterError::UnsupportedAlgorithm(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut file = tokio::fs::File::open(path).await?;
        let mut buf = vec![0u8; self.buf_size];
        let mut total: u64 = 0;

        loop {
            let n = match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            for (_, hasher) in hashers.iter_mut() {
                hasher.update(&buf[..n]);
            }
            total += n as u64;
        }

        for name in &self.algos {
            counter!(HASH_BYTES_TOTAL, LABEL_ALGORITHM => name.clone()).increment(total);
        }

        Ok(hashers
            .into_iter()
            .map(|(name, hasher)| (name, Value::from(hasher.finalize())))
            .collect())
    }
}

impl Stage for HashFileStage {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn error_tag(&self) -> &str {
        ERROR_TAG
    }

    async fn process(&self, mut event: LogEvent) -> (LogEvent, bool) {
        let _timer = StageTimer::start(MODULE_NAME);

        let path = event.get_str(&self.field).to_owned();
        if path.is_empty() {
            let err = FilterError::MissingField(self.field.clone());
            return fail(event, MODULE_NAME, ERROR_TAG, &err);
        }

        match self.hash_file(Path::new(&path)).await {
            Ok(digests) => {
                debug!(path = %path, algorithms = digests.len(), "file hashed");
                event.set(self.output.as_str(), digests);
                succeed(event, MODULE_NAME)
            }
            Err(e) => fail(event, MODULE_NAME, ERROR_TAG, &e),
        }
    }
}
