use crate::error::{BoxError, PipelineError, PipelineResult};
use crate::event::{ErrorEvent, EventSender, send_event};
use crate::stage::Flow;
use std::sync::Arc;
use tokio::sync::mpsc;

/// 映射函数：失败时返回装箱错误
pub type MapFn<I, O> = Arc<dyn Fn(I) -> Result<O, BoxError> + Send + Sync>;

/// 映射阶段
///
/// 对每个条目应用转换：成功则按序转发；失败则投递一个临时 `ErrorEvent`
/// （消息 "map transform error"）并丢弃该条目，流继续处理。
pub struct Map<I, O> {
    transform: MapFn<I, O>,
}

impl<I, O> Map<I, O> {
    pub fn new<F, E>(transform: F) -> Self
    where
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            transform: Arc::new(move |item| transform(item).map_err(Into::into)),
        }
    }

    /// 转换函数缺失时构造失败
    pub fn try_new(transform: Option<MapFn<I, O>>) -> PipelineResult<Self> {
        let transform = transform.ok_or(PipelineError::MissingTransform)?;
        Ok(Self { transform })
    }
}

impl<I, O> Clone for Map<I, O> {
    fn clone(&self) -> Self {
        Self {
            transform: self.transform.clone(),
        }
    }
}

impl<I, O> Flow<I, O> for Map<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn transform(&self, mut input: mpsc::Receiver<I>, events: EventSender) -> mpsc::Receiver<O> {
        let (tx, rx) = mpsc::channel(1);
        let transform = self.transform.clone();

        tokio::spawn(async move {
            while let Some(item) = input.recv().await {
                match transform(item) {
                    Ok(out) => {
                        if tx.send(out).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        send_event(
                            &events,
                            ErrorEvent::from_boxed("map transform error", err, true),
                        );
                    }
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, event_channel};
    use crate::flow::testing::{drain, feed};

    #[tokio::test]
    async fn applies_transform_elementwise() {
        let map = Map::new(|v: i32| Ok::<_, BoxError>(v.to_string()));
        let out = map.transform(feed(vec![1, 2, 3, 4, 5]), EventSender::detached());
        assert_eq!(drain(out).await, vec!["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn failing_items_are_dropped_and_reported() {
        let (events, mut rx) = event_channel(16);
        let map = Map::new(|v: i32| {
            if v % 3 == 0 {
                Err(format!("{v} is divisible by three"))
            } else {
                Ok(v * 10)
            }
        });

        let out = map.transform(feed((1..=9).collect()), events);
        assert_eq!(drain(out).await, vec![10, 20, 40, 50, 70, 80]);

        let mut errors = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            errors.push(ev);
        }
        assert_eq!(errors.len(), 3);
        for ev in &errors {
            assert_eq!(ev.kind(), EventKind::Error);
            let err = ev.as_error().expect("error event");
            assert_eq!(err.message(), "map transform error");
            assert!(err.is_temporary());
        }
        assert_eq!(errors[0].to_string(), "map transform error: 3 is divisible by three");
    }

    #[tokio::test]
    async fn failure_without_event_stream_keeps_flowing() {
        let map = Map::new(|v: u8| v.checked_sub(1).ok_or("underflow"));
        let out = map.transform(feed(vec![0, 1, 2]), EventSender::detached());
        assert_eq!(drain(out).await, vec![0, 1]);
    }

    #[test]
    fn missing_transform_fails_construction() {
        let err = Map::<i32, String>::try_new(None).err().expect("must fail");
        assert!(matches!(err, PipelineError::MissingTransform));
    }
}
