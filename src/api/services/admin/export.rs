//! 钱包流水 CSV 导出（流式响应）

use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use bytes::Bytes;
use chrono::Utc;
use csv::WriterBuilder;
use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, error, info};

use crate::api::constants::EXPORT_BATCH_SIZE;
use crate::api::services::types::CsvTransactionRow;
use crate::api::state::AppState;
use crate::errors::Result;
use crate::storage::WalletTransaction;

impl From<WalletTransaction> for CsvTransactionRow {
    fn from(tx: WalletTransaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            kind: tx.kind.to_string(),
            amount: tx.amount,
            reference: tx.reference,
            description: tx.description,
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// 把一批流水序列化为 CSV 片段；只有第一批带表头
pub fn encode_batch(batch: Vec<WalletTransaction>, with_header: bool) -> csv::Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(Vec::new());
    for tx in batch {
        writer.serialize(CsvTransactionRow::from(tx))?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// 分批流 -> CSV 字节流
///
/// 序列化在 blocking 线程池执行；数据库错误写成 `# ERROR` 注释行后结束。
pub fn ledger_csv_stream<S>(batches: S) -> impl Stream<Item = std::result::Result<Bytes, actix_web::Error>>
where
    S: Stream<Item = Result<Vec<WalletTransaction>>> + Send + 'static,
{
    let batches = Box::pin(batches);
    stream::unfold(
        (batches, true, 0usize, false),
        |(mut batches, first, exported, done)| async move {
            if done {
                return None;
            }
            match batches.next().await {
                Some(Ok(batch)) => {
                    let rows = batch.len();
                    let encoded = tokio::task::spawn_blocking(move || encode_batch(batch, first)).await;
                    let chunk = match encoded {
                        Ok(Ok(chunk)) => chunk,
                        Ok(Err(e)) => {
                            error!("Failed to encode CSV batch: {}", e);
                            return Some((
                                Err(actix_web::error::ErrorInternalServerError("CSV generation error")),
                                (batches, first, exported, true),
                            ));
                        }
                        Err(e) => {
                            error!("CSV encoding task failed: {}", e);
                            return Some((
                                Err(actix_web::error::ErrorInternalServerError("CSV task failed")),
                                (batches, first, exported, true),
                            ));
                        }
                    };
                    let exported = exported + rows;
                    debug!("Ledger export: {} rows sent", exported);
                    Some((Ok(Bytes::from(chunk)), (batches, false, exported, false)))
                }
                Some(Err(e)) => {
                    error!("Ledger export aborted after {} rows: {}", exported, e);
                    let line = format!("# ERROR: {}\n", e.message());
                    Some((Ok(Bytes::from(line)), (batches, first, exported, true)))
                }
                None => {
                    info!("Ledger export completed: {} rows", exported);
                    // 空账本时仍返回表头
                    if first {
                        return Some((
                            Ok(Bytes::from(header_line())),
                            (batches, false, exported, true),
                        ));
                    }
                    None
                }
            }
        },
    )
}

/// csv 只在写第一条记录时输出表头，空账本需要单独补上
fn header_line() -> Vec<u8> {
    b"id,user_id,kind,amount,reference,description,created_at\n".to_vec()
}

/// GET /admin/v1/transactions/export
pub async fn export_transactions(state: web::Data<AppState>) -> ActixResult<impl Responder> {
    let filename = format!("transactions_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
    info!("Admin API: streaming ledger export to {}", filename);

    let body = ledger_csv_stream(state.wallet.transaction_batches(EXPORT_BATCH_SIZE));
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .streaming(body))
}
