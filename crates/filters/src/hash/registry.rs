//! 해시 알고리즘 레지스트리
//!
//! "해시 알고리즘"은 곧 `{update(bytes), finalize() -> bytes}` 능력이므로
//! [`StreamingHasher`] trait 하나로 표현하고, 알고리즘 이름 → 생성자(factory)를
//! [`HashRegistry`]에 등록합니다.
//!
//! 레지스트리는 전역 가변 상태가 아니라 프로세스 시작 시 한 번 만들어
//! `Arc`로 스테이지에 주입하는 명시적 객체입니다.
//! 새 알고리즘은 스테이지 수정 없이 [`HashRegistry::register`]로 추가할 수 있습니다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sha2::Digest;

/// 스트리밍 해시 누산기
///
/// 이벤트마다 새로 생성되며 이벤트 간에 재사용되지 않습니다.
pub trait StreamingHasher: Send {
    /// 데이터를 누적합니다.
    fn update(&mut self, data: &[u8]);

    /// 누적을 마치고 다이제스트 바이트를 반환합니다.
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// 새 누산기를 만드는 인자 없는 생성자
pub type HasherFactory = Arc<dyn Fn() -> Box<dyn StreamingHasher> + Send + Sync>;

/// 알고리즘 이름 → 생성자 레지스트리
#[derive(Clone, Default)]
pub struct HashRegistry {
    factories: HashMap<String, HasherFactory>,
}

impl HashRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기본 알고리즘이 등록된 레지스트리를 생성합니다.
    ///
    /// `md5`, `sha1`, `sha256`, `sha512`, `crc32`, `fnv1a` (128비트)
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("md5", || Box::new(DigestHasher(md5::Md5::new())));
        registry.register("sha1", || Box::new(DigestHasher(sha1::Sha1::new())));
        registry.register("sha256", || Box::new(DigestHasher(sha2::Sha256::new())));
        registry.register("sha512", || Box::new(DigestHasher(sha2::Sha512::new())));
        registry.register("crc32", || Box::new(Crc32Hasher::default()));
        registry.register("fnv1a", || Box::new(Fnv1a128Hasher::default()));
        registry
    }

    /// 알고리즘을 등록합니다. 같은 이름이 있으면 교체됩니다.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn StreamingHasher> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// 등록 여부
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// 새 누산기를 생성합니다.
    pub fn create(&self, name: &str) -> Option<Box<dyn StreamingHasher>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// 등록된 알고리즘 이름 (정렬됨)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 메모리 내 데이터의 다이제스트를 계산합니다.
    pub fn digest_bytes(&self, name: &str, data: &[u8]) -> Option<Vec<u8>> {
        let mut hasher = self.create(name)?;
        hasher.update(data);
        Some(hasher.finalize())
    }
}

impl fmt::Debug for HashRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRegistry")
            .field("algorithms", &self.names())
            .finish()
    }
}

// ─── 기본 알고리즘 ─────────────────────────────────────────────────

/// RustCrypto `Digest` 구현체 어댑터 (md5, sha1, sha2 계열)
struct DigestHasher<D>(D);

impl<D: Digest + Send> StreamingHasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

/// CRC-32 (IEEE), 빅엔디언 4바이트
#[derive(Default)]
struct Crc32Hasher {
    hasher: crc32fast::Hasher,
}

impl StreamingHasher for Crc32Hasher {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.hasher.finalize().to_be_bytes().to_vec()
    }
}

const FNV128_OFFSET_BASIS: u128 = 0x6c62272e07bb014262b821756295c58d;
const FNV128_PRIME: u128 = 0x0000000001000000000000000000013b;

/// FNV-1a 128비트 (비암호학적), 빅엔디언 16바이트
struct Fnv1a128Hasher {
    state: u128,
}

impl Default for Fnv1a128Hasher {
    fn default() -> Self {
        Self {
            state: FNV128_OFFSET_BASIS,
        }
    }
}

impl StreamingHasher for Fnv1a128Hasher {
    fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.state ^= u128::from(byte);
            self.state = self.state.wrapping_mul(FNV128_PRIME);
        }
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.state.to_be_bytes().to_vec()
    }
}
