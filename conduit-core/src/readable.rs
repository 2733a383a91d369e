//! 字节载荷协议（Readable）
//!
//! 边界适配器之间传递的条目只需暴露一个操作：返回原始字节或读取失败。
//! 组合条目可以同时暴露“处理后数据”视图与“原始消息”视图。
//! 需要外部确认的条目（例如从消息中间件消费的消息）额外实现 `Ackable`，
//! 并通过 `Readable::as_ackable` 暴露该能力。
//!
use crate::error::PipelineResult;

/// 可读取字节的载荷
pub trait Readable: Send + Sync {
    fn read(&self) -> PipelineResult<Vec<u8>>;

    /// 若该载荷需要外部确认，返回确认能力
    fn as_ackable(&self) -> Option<&dyn Ackable> {
        None
    }
}

/// 需在本地副作用成功后向外部确认的条目
pub trait Ackable: Send + Sync {
    fn ack(&self) -> PipelineResult<()>;
}

/// 暴露结构化数据视图
pub trait DataReadable {
    type Data: Readable;

    fn data(&self) -> &Self::Data;
}

/// 暴露原始消息视图
pub trait RawReadable {
    type Raw: Readable;

    fn raw(&self) -> &Self::Raw;
}

/// 同时暴露数据视图与原始视图
pub trait DataRawReadable: DataReadable + RawReadable {}

impl<T: DataReadable + RawReadable> DataRawReadable for T {}

/// 纯字节载荷
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Readable for Payload {
    fn read(&self) -> PipelineResult<Vec<u8>> {
        Ok(self.0.clone())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

/// 数据视图与原始视图的组合条目
#[derive(Clone, Debug)]
pub struct Envelope<D, R> {
    data: D,
    raw: R,
}

impl<D, R> Envelope<D, R> {
    pub fn new(data: D, raw: R) -> Self {
        Self { data, raw }
    }

    pub fn into_parts(self) -> (D, R) {
        (self.data, self.raw)
    }
}

impl<D: Readable, R> DataReadable for Envelope<D, R> {
    type Data = D;

    fn data(&self) -> &D {
        &self.data
    }
}

impl<D, R: Readable> RawReadable for Envelope<D, R> {
    type Raw = R;

    fn raw(&self) -> &R {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    struct Broken;

    impl Readable for Broken {
        fn read(&self) -> PipelineResult<Vec<u8>> {
            Err(PipelineError::read("broken payload"))
        }
    }

    fn views<T: DataRawReadable>(item: &T) -> (PipelineResult<Vec<u8>>, PipelineResult<Vec<u8>>) {
        (item.data().read(), item.raw().read())
    }

    #[test]
    fn payload_reads_its_bytes() {
        let p = Payload::from("hello");
        assert_eq!(p.read().expect("read"), b"hello".to_vec());
        assert!(p.as_ackable().is_none());
    }

    #[test]
    fn envelope_exposes_both_views() {
        let env = Envelope::new(Payload::from("{\"a\":1}"), Payload::from("a=1"));
        let (data, raw) = views(&env);
        assert_eq!(data.expect("data"), b"{\"a\":1}".to_vec());
        assert_eq!(raw.expect("raw"), b"a=1".to_vec());
    }

    #[test]
    fn read_failure_is_surfaced() {
        let env = Envelope::new(Broken, Payload::from("raw"));
        let (data, raw) = views(&env);
        assert!(matches!(data, Err(PipelineError::Read { .. })));
        assert!(raw.is_ok());
    }
}
