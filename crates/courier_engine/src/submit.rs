use std::sync::Arc;

use bytes::Bytes;
use courier_core::WorkItem;
use futures_util::Stream;

use crate::{EngineEvent, JobHandle, ProgressSink, TransportError};

/// Sends one unit of work to the job-accepting service.
///
/// A single attempt: implementations never retry. Transfer progress goes to
/// `sink` while the request is in flight.
#[async_trait::async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(
        &self,
        item: &WorkItem,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<JobHandle, TransportError>;
}

/// Request body that reports every slice as the transport pulls it, then
/// reports completion once the last slice is gone.
pub(crate) fn upload_stream(
    payload: Bytes,
    chunk_size: usize,
    sink: Arc<dyn ProgressSink>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let chunk_size = chunk_size.max(1);
    let total = payload.len() as u64;
    futures_util::stream::unfold((payload, 0usize), move |(payload, offset)| {
        let sink = Arc::clone(&sink);
        async move {
            if offset >= payload.len() {
                sink.emit(EngineEvent::TransferComplete);
                return None;
            }
            let end = (offset + chunk_size).min(payload.len());
            let chunk = payload.slice(offset..end);
            sink.emit(EngineEvent::Transfer {
                sent: end as u64,
                total: Some(total),
            });
            Some((Ok::<_, std::io::Error>(chunk), (payload, end)))
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures_util::StreamExt;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EngineEvent>>);

    impl ProgressSink for Recorder {
        fn emit(&self, event: EngineEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn stream_reports_each_slice_then_completion() {
        let recorder = Arc::new(Recorder::default());
        let stream = upload_stream(Bytes::from_static(b"abcdefg"), 3, recorder.clone());
        let chunks: Vec<Bytes> = stream.map(|chunk| chunk.unwrap()).collect().await;

        assert_eq!(chunks, vec!["abc", "def", "g"]);
        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                EngineEvent::Transfer { sent: 3, total: Some(7) },
                EngineEvent::Transfer { sent: 6, total: Some(7) },
                EngineEvent::Transfer { sent: 7, total: Some(7) },
                EngineEvent::TransferComplete,
            ]
        );
    }

    #[tokio::test]
    async fn empty_payload_still_completes() {
        let recorder = Arc::new(Recorder::default());
        let chunks: Vec<_> = upload_stream(Bytes::new(), 16, recorder.clone())
            .collect()
            .await;
        assert!(chunks.is_empty());
        assert_eq!(
            recorder.0.lock().unwrap().clone(),
            vec![EngineEvent::TransferComplete]
        );
    }
}
