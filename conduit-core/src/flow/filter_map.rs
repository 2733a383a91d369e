use super::{MapFn, Predicate};
use crate::error::{BoxError, PipelineError, PipelineResult};
use crate::event::{ErrorEvent, EventSender, send_event};
use crate::stage::Flow;
use std::sync::Arc;
use tokio::sync::mpsc;

/// 过滤映射阶段：一次遍历完成 `Filter` 与 `Map`，不产生中间流
///
/// 谓词为假时静默丢弃；为真时应用转换，失败则投递临时 `ErrorEvent`
/// （消息 "filtermap error transforming data"）并丢弃该条目。
pub struct FilterMap<I, O> {
    predicate: Predicate<I>,
    transform: MapFn<I, O>,
}

impl<I, O> FilterMap<I, O> {
    pub fn new<P, F, E>(predicate: P, transform: F) -> Self
    where
        P: Fn(&I) -> bool + Send + Sync + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            predicate: Arc::new(predicate),
            transform: Arc::new(move |item| transform(item).map_err(Into::into)),
        }
    }

    /// 谓词或转换函数任一缺失时构造失败
    pub fn try_new(
        predicate: Option<Predicate<I>>,
        transform: Option<MapFn<I, O>>,
    ) -> PipelineResult<Self> {
        let predicate = predicate.ok_or(PipelineError::MissingPredicate)?;
        let transform = transform.ok_or(PipelineError::MissingTransform)?;
        Ok(Self {
            predicate,
            transform,
        })
    }
}

impl<I, O> Clone for FilterMap<I, O> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            transform: self.transform.clone(),
        }
    }
}

impl<I, O> Flow<I, O> for FilterMap<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn transform(&self, mut input: mpsc::Receiver<I>, events: EventSender) -> mpsc::Receiver<O> {
        let (tx, rx) = mpsc::channel(1);
        let predicate = self.predicate.clone();
        let transform = self.transform.clone();

        tokio::spawn(async move {
            while let Some(item) = input.recv().await {
                if !predicate(&item) {
                    continue;
                }
                match transform(item) {
                    Ok(out) => {
                        if tx.send(out).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        send_event(
                            &events,
                            ErrorEvent::from_boxed("filtermap error transforming data", err, true),
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
    use crate::event::event_channel;
    use crate::flow::testing::{drain, feed};

    #[tokio::test]
    async fn filters_then_maps() {
        let fm = FilterMap::new(
            |v: &i32| v % 2 == 0,
            |v: i32| Ok::<_, BoxError>(v.to_string()),
        );
        let out = fm.transform(feed((1..=5).collect()), EventSender::detached());
        assert_eq!(drain(out).await, vec!["2", "4"]);
    }

    #[tokio::test]
    async fn transform_failures_emit_one_event_each() {
        let (events, mut rx) = event_channel(16);
        let fm = FilterMap::new(
            |v: &i32| *v > 0,
            |v: i32| if v == 4 { Err("four") } else { Ok(v) },
        );

        let out = fm.transform(feed(vec![-1, 2, 4, 0, 6, 4]), events);
        assert_eq!(drain(out).await, vec![2, 6]);

        let mut n = 0;
        while let Ok(ev) = rx.try_recv() {
            let err = ev.as_error().expect("error event");
            assert_eq!(err.message(), "filtermap error transforming data");
            assert!(err.is_temporary());
            n += 1;
        }
        assert_eq!(n, 2);
    }

    #[tokio::test]
    async fn predicate_rejects_never_reach_transform() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let fm = FilterMap::new(
            |v: &u32| *v >= 10,
            move |v: u32| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(v)
            },
        );

        let out = fm.transform(feed(vec![1, 10, 2, 20]), EventSender::detached());
        assert_eq!(drain(out).await, vec![10, 20]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_closures_fail_construction() {
        let t: MapFn<i32, i32> = Arc::new(|v| Ok(v));
        let p: Predicate<i32> = Arc::new(|_| true);

        let err = FilterMap::try_new(None, Some(t.clone())).err().expect("must fail");
        assert!(matches!(err, PipelineError::MissingPredicate));

        let err = FilterMap::<i32, i32>::try_new(Some(p.clone()), None).err().expect("must fail");
        assert!(matches!(err, PipelineError::MissingTransform));

        assert!(FilterMap::try_new(Some(p), Some(t)).is_ok());
    }
}
