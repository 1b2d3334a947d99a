// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::errors::{GateError, ServiceError};
use crate::gate::AuthorizationGate;
use crate::protocol::{Reply, handle_line};
use crate::scope::SecretResolver;
use crate::updater::Updater;

/// Longest request line accepted, newline excluded.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Serve the line protocol until the input closes or `shutdown` resolves.
///
/// Commands are handled one at a time, in order. Returns the number of
/// requests answered.
pub async fn serve<S, U, R, W, F>(
    gate: &AuthorizationGate<S, U>,
    mut reader: R,
    mut writer: W,
    shutdown: F,
) -> Result<u64, ServiceError>
where
    S: SecretResolver,
    U: Updater,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let mut handled = 0u64;
    tokio::pin!(shutdown);

    info!("command server started");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested, stopping command server");
                break;
            }
            line = read_line(&mut reader) => {
                let Some(line) = line? else {
                    debug!("input closed");
                    break;
                };

                let reply = match line {
                    Ok(text) if text.trim().is_empty() => continue,
                    Ok(text) => handle_line(gate, &text).await,
                    Err(e) => {
                        warn!(error = %e, "rejecting unreadable request line");
                        Reply::error(None, &e)
                    }
                };

                let mut out = serde_json::to_vec(&reply)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
                handled += 1;
            }
        }
    }

    info!(%handled, "command server stopped");
    Ok(handled)
}

/// Read one line. `Ok(None)` on EOF; the inner error is a line that can not
/// be handed to the protocol (too long or not UTF-8).
async fn read_line<R>(reader: &mut R) -> std::io::Result<Option<Result<String, GateError>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > MAX_LINE_LEN {
        discard_line(reader).await?;
        return Ok(Some(Err(GateError::InvalidFormat(format!(
            "request line exceeds {} bytes",
            MAX_LINE_LEN
        )))));
    }

    Ok(Some(String::from_utf8(buf).map_err(|_| {
        GateError::InvalidFormat("request line is not valid UTF-8".to_string())
    })))
}

/// Skip input up to and including the next newline.
async fn discard_line<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (consumed, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|b| *b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(consumed);
        if done {
            return Ok(());
        }
    }
}
