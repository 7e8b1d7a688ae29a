use std::sync::Arc;

use crate::db::LedgerRepository;
use crate::enums::{ ExportEntity, ExportFormat };
use crate::error::Result;

pub struct ExportService {
    repository: Arc<LedgerRepository>,
}

impl ExportService {
    pub fn new(repository: Arc<LedgerRepository>) -> Self {
        Self { repository }
    }

    /// Full-table dump in the requested format. CSV follows RFC 4180:
    /// CRLF line endings, fields containing commas, quotes or line
    /// breaks are quoted, embedded quotes are doubled.
    pub async fn export(&self, entity: ExportEntity, format: ExportFormat) -> Result<String> {
        match entity {
            ExportEntity::Users => {
                let rows = self.repository.all_users().await?;
                match format {
                    ExportFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
                    ExportFormat::Csv => {
                        let mut out = csv_row(
                            &["id", "external_id", "handle", "role", "balance_cents", "created_at"]
                        );
                        for row in rows {
                            out.push_str(
                                &csv_row(
                                    &[
                                        &row.id.to_string(),
                                        &row.external_id.to_string(),
                                        row.handle.as_deref().unwrap_or(""),
                                        &row.role,
                                        &row.balance_cents.to_string(),
                                        &row.created_at.to_rfc3339(),
                                    ]
                                )
                            );
                        }
                        Ok(out)
                    }
                }
            }
            ExportEntity::Withdrawals => {
                let rows = self.repository.all_withdrawals().await?;
                match format {
                    ExportFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
                    ExportFormat::Csv => {
                        let mut out = csv_row(
                            &[
                                "id",
                                "user_id",
                                "amount_cents",
                                "destination",
                                "network",
                                "status",
                                "requested_at",
                                "decided_at",
                                "decided_by",
                                "txid",
                                "note",
                            ]
                        );
                        for row in rows {
                            let decided_at = row.decided_at
                                .map(|ts| ts.to_rfc3339())
                                .unwrap_or_default();
                            out.push_str(
                                &csv_row(
                                    &[
                                        &row.id.to_string(),
                                        &row.user_id.to_string(),
                                        &row.amount_cents.to_string(),
                                        &row.destination,
                                        &row.network,
                                        &row.status,
                                        &row.requested_at.to_rfc3339(),
                                        &decided_at,
                                        row.decided_by.as_deref().unwrap_or(""),
                                        row.txid.as_deref().unwrap_or(""),
                                        row.note.as_deref().unwrap_or(""),
                                    ]
                                )
                            );
                        }
                        Ok(out)
                    }
                }
            }
            ExportEntity::Audit => {
                let rows = self.repository.all_audit().await?;
                match format {
                    ExportFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
                    ExportFormat::Csv => {
                        let mut out = csv_row(
                            &[
                                "id",
                                "actor",
                                "action",
                                "entity_type",
                                "entity_id",
                                "meta",
                                "created_at",
                            ]
                        );
                        for row in rows {
                            out.push_str(
                                &csv_row(
                                    &[
                                        &row.id.to_string(),
                                        &row.actor,
                                        &row.action,
                                        &row.entity_type,
                                        &row.entity_id.to_string(),
                                        &row.meta.to_string(),
                                        &row.created_at.to_rfc3339(),
                                    ]
                                )
                            );
                        }
                        Ok(out)
                    }
                }
            }
        }
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_row(fields: &[&str]) -> String {
    let mut row = fields
        .iter()
        .map(|field| csv_escape(field))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields_pass_through() {
        assert_eq!(csv_escape("abc"), "abc");
        assert_eq!(csv_escape(""), "");
    }

    #[test]
    fn test_special_fields_are_quoted() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_row_terminator() {
        assert_eq!(csv_row(&["a", "b,c"]), "a,\"b,c\"\r\n");
    }
}
