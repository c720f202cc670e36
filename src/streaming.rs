//! Server-sent event decoding for streaming chat completions.
//!
//! Line buffering and UTF-8 boundaries are handled by `eventsource-stream`.
//! Each `data:` payload is decoded as one JSON chunk; the stream ends at the
//! `[DONE]` marker or when the connection closes.

use eventsource_stream::{EventStreamError, Eventsource};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;

use crate::error::{AiProxyError, Result};
use crate::transport::ByteStream;

const DONE_MARKER: &str = "[DONE]";

/// Stream of decoded chunks.
pub type ChunkStream<T> = BoxStream<'static, Result<T>>;

/// Decode an SSE byte stream into typed JSON chunks.
pub fn decode_json_events<T>(bytes: ByteStream) -> ChunkStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    bytes
        .eventsource()
        .take_while(|event| {
            let done = matches!(event, Ok(e) if e.data.trim() == DONE_MARKER);
            futures::future::ready(!done)
        })
        .filter_map(|event| async move {
            match event {
                Ok(event) if event.data.trim().is_empty() => None,
                Ok(event) => Some(serde_json::from_str::<T>(&event.data).map_err(|e| {
                    AiProxyError::decode_failure(e.to_string(), event.data.as_bytes())
                })),
                Err(err) => Some(Err(classify(err))),
            }
        })
        .boxed()
}

fn classify(err: EventStreamError<AiProxyError>) -> AiProxyError {
    match err {
        EventStreamError::Transport(e) => e,
        other => AiProxyError::DecodeFailure {
            message: format!("SSE parsing error: {other}"),
            raw: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Chunk {
        n: u32,
    }

    fn byte_stream(chunks: Vec<Result<&'static str>>) -> ByteStream {
        futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| c.map(|s| Bytes::from_static(s.as_bytes()))),
        )
        .boxed()
    }

    #[tokio::test]
    async fn test_decodes_until_done_marker() {
        let bytes = byte_stream(vec![
            Ok("data: {\"n\":1}\n\n"),
            Ok("data: {\"n\""),
            Ok(":2}\n\n: keep-alive\n\n"),
            Ok("data: [DONE]\n\n"),
            Ok("data: {\"n\":3}\n\n"),
        ]);

        let chunks: Vec<Chunk> = decode_json_events(bytes)
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec![Chunk { n: 1 }, Chunk { n: 2 }]);
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_decode_failure() {
        let bytes = byte_stream(vec![Ok("data: {\"n\":\"one\"}\n\n")]);
        let results: Vec<Result<Chunk>> = decode_json_events(bytes).collect().await;
        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(AiProxyError::DecodeFailure { raw, .. }) => {
                assert_eq!(raw.as_deref(), Some("{\"n\":\"one\"}"));
            }
            other => panic!("expected decode failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let bytes = byte_stream(vec![
            Ok("data: {\"n\":1}\n\n"),
            Err(AiProxyError::TransportFailure("connection reset".into())),
        ]);
        let results: Vec<Result<Chunk>> = decode_json_events(bytes).collect().await;
        assert!(matches!(results[0], Ok(Chunk { n: 1 })));
        assert!(matches!(
            results.last(),
            Some(Err(AiProxyError::TransportFailure(_)))
        ));
    }
}
