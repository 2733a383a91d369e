use crate::error::{PipelineError, PipelineResult};
use crate::event::EventSender;
use crate::stage::Flow;
use std::sync::Arc;
use tokio::sync::mpsc;

/// 谓词：返回 `true` 的条目被保留
pub type Predicate<I> = Arc<dyn Fn(&I) -> bool + Send + Sync>;

/// 过滤阶段
///
/// 仅转发满足谓词的条目；被丢弃的条目不产生任何事件（丢弃不是错误）。
/// 存活条目保持原有相对顺序。
pub struct Filter<I> {
    predicate: Predicate<I>,
}

impl<I> Filter<I> {
    pub fn new<P>(predicate: P) -> Self
    where
        P: Fn(&I) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// 谓词缺失时构造失败
    pub fn try_new(predicate: Option<Predicate<I>>) -> PipelineResult<Self> {
        let predicate = predicate.ok_or(PipelineError::MissingPredicate)?;
        Ok(Self { predicate })
    }
}

impl<I> Clone for Filter<I> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
        }
    }
}

impl<I> Flow<I, I> for Filter<I>
where
    I: Send + 'static,
{
    fn transform(&self, mut input: mpsc::Receiver<I>, _events: EventSender) -> mpsc::Receiver<I> {
        let (tx, rx) = mpsc::channel(1);
        let predicate = self.predicate.clone();

        tokio::spawn(async move {
            while let Some(item) = input.recv().await {
                if !predicate(&item) {
                    continue;
                }
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        rx
    }
}
