use bytes::Bytes;
use lambda_api_http::codec::multipart::MultipartEncoder;

const BOUNDARY: &str = "bench-boundary-7MA4YWxkTrZu0gW";

/// One multipart body to decode, generated from a part count and a part size.
#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    body: Bytes,
    content_type: String,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup) -> Self {
        let (parts, part_size) = group.shape();
        let content = "x".repeat(part_size);

        let mut encoder = MultipartEncoder::new(BOUNDARY).field("description", "benchmark upload");
        for i in 0..parts {
            encoder = encoder.file(format!("file{i}"), format!("file{i}.txt"), Some("text/plain"), content.clone());
        }
        let body = encoder.encode().unwrap_or_default();
        Self { name, group, body, content_type: encoder.content_type() }
    }

    pub fn small(name: &'static str) -> Self {
        Self::new(name, TestGroup::Small)
    }

    pub fn normal(name: &'static str) -> Self {
        Self::new(name, TestGroup::Normal)
    }

    pub fn large(name: &'static str) -> Self {
        Self::new(name, TestGroup::Large)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    /// The number of file parts and the size of each
    fn shape(self) -> (usize, usize) {
        match self {
            TestGroup::Small => (1, 64),
            TestGroup::Normal => (4, 4 * 1024),
            TestGroup::Large => (16, 64 * 1024),
        }
    }
}
