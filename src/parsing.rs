//! CSV journal deserialization.
//!
//! Parsing happens in two stages:
//! 1. Serde deserializes each CSV row into a flat `CsvCommand`.
//! 2. `TryFrom<CsvCommand>` converts it into a strongly-typed [`Command`].
//!
//! Malformed rows or rows missing a required column are logged and skipped.
//! Rows name the records they create in the `ref` column; later rows use that
//! label to edit or delete them, or to point a daily transaction at a wallet
//! or client.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    domain::{AccountNumber, DailyKind, OperatorNumber, TransferKind, UnknownKind, WalletKind},
    engine::{
        DailyPatch, DailyRequest, LoadPatch, LoadRequest, NewBankAccount, NewClient, NewOperator,
        NewWallet, RechargePatch, RechargeRequest, TransferPatch, TransferRequest,
    },
};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Op {
    OpenBank,
    OpenWallet,
    OpenOperator,
    OpenClient,
    AdjustBank,
    AdjustWallet,
    Transfer,
    EditTransfer,
    DeleteTransfer,
    Recharge,
    EditRecharge,
    DeleteRecharge,
    Load,
    EditLoad,
    DeleteLoad,
    Daily,
    EditDaily,
    DeleteDaily,
    Payment,
    OpeningCash,
}

/// Flat representation of a single journal row. Which columns matter depends
/// on `op`; the rest stay empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CsvCommand {
    op: Option<Op>,
    r#ref: Option<String>,
    /// Bank account number or operator number.
    key: Option<String>,
    wallet: Option<String>,
    client: Option<String>,
    kind: Option<String>,
    name: Option<String>,
    number: Option<String>,
    bank: Option<String>,
    branch: Option<String>,
    channel: Option<String>,
    amount: Option<Decimal>,
    fee: Option<Decimal>,
    pay: Option<Decimal>,
    total: Option<Decimal>,
    profit: Option<Decimal>,
    due: Option<Decimal>,
    note: Option<String>,
    date: Option<NaiveDate>,
}

/// One journal instruction. `reference` labels the record a create produces,
/// or names the record an edit or delete targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    OpenBank(NewBankAccount),
    OpenWallet {
        reference: String,
        wallet: NewWallet,
    },
    OpenOperator(NewOperator),
    OpenClient {
        reference: String,
        client: NewClient,
    },
    AdjustBank {
        account: AccountNumber,
        amount: Decimal,
    },
    AdjustWallet {
        wallet: String,
        amount: Decimal,
    },
    Transfer {
        reference: Option<String>,
        request: TransferRequest,
    },
    EditTransfer {
        reference: String,
        patch: TransferPatch,
    },
    DeleteTransfer {
        reference: String,
    },
    Recharge {
        reference: Option<String>,
        request: RechargeRequest,
    },
    EditRecharge {
        reference: String,
        patch: RechargePatch,
    },
    DeleteRecharge {
        reference: String,
    },
    Load {
        reference: Option<String>,
        request: LoadRequest,
    },
    EditLoad {
        reference: String,
        patch: LoadPatch,
    },
    DeleteLoad {
        reference: String,
    },
    Daily {
        reference: Option<String>,
        wallet: Option<String>,
        client: Option<String>,
        request: DailyRequest,
    },
    EditDaily {
        reference: String,
        wallet: Option<String>,
        client: Option<String>,
        patch: DailyPatch,
    },
    DeleteDaily {
        reference: String,
    },
    Payment {
        client: String,
        amount: Decimal,
    },
    OpeningCash {
        date: Option<NaiveDate>,
        amount: Decimal,
    },
}

impl Command {
    /// Date the command books under, when it names one explicitly.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Transfer { request, .. } => request.date,
            Self::EditTransfer { patch, .. } => patch.date,
            Self::Recharge { request, .. } => request.date,
            Self::EditRecharge { patch, .. } => patch.date,
            Self::Load { request, .. } => request.date,
            Self::Daily { request, .. } => request.date,
            Self::EditDaily { patch, .. } => patch.date,
            Self::OpeningCash { date, .. } => *date,
            _ => None,
        }
    }
}

/// Returns an iterator that lazily deserializes journal rows into commands,
/// skipping any rows that fail to parse or convert.
pub fn deserialize_csv<D: std::io::Read>(
    reader: &mut csv::Reader<D>,
) -> impl Iterator<Item = Command> {
    reader
        .deserialize::<CsvCommand>()
        .filter_map(|result| match result {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("Failed to parse journal row: {e}");
                None
            }
        })
        .filter_map(|row| match Command::try_from(row) {
            Ok(command) => Some(command),
            Err(e) => {
                warn!("Failed to convert journal row to a command: {e}");
                None
            }
        })
}

#[derive(Debug, thiserror::Error)]
pub enum IntoCommandError {
    #[error("missing `op` column")]
    MissingOp,
    #[error("missing `{column}` for `{op}`")]
    MissingColumn { op: &'static str, column: &'static str },
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),
}

fn need<T>(value: Option<T>, op: &'static str, column: &'static str) -> Result<T, IntoCommandError> {
    value.ok_or(IntoCommandError::MissingColumn { op, column })
}

fn parse_kind<K: std::str::FromStr<Err = UnknownKind>>(
    kind: Option<&str>,
) -> Result<Option<K>, IntoCommandError> {
    Ok(kind.map(|kind| kind.parse::<K>()).transpose()?)
}

impl TryFrom<CsvCommand> for Command {
    type Error = IntoCommandError;

    fn try_from(row: CsvCommand) -> Result<Self, Self::Error> {
        let op = row.op.ok_or(IntoCommandError::MissingOp)?;
        let command = match op {
            Op::OpenBank => Command::OpenBank(NewBankAccount {
                account_number: need(row.key, "open_bank", "key")?.into(),
                bank: need(row.bank, "open_bank", "bank")?,
                branch: need(row.branch, "open_bank", "branch")?,
                routing_no: None,
                account_name: need(row.name, "open_bank", "name")?,
                balance: row.amount,
            }),
            Op::OpenWallet => Command::OpenWallet {
                reference: need(row.r#ref, "open_wallet", "ref")?,
                wallet: NewWallet {
                    label: need(row.name, "open_wallet", "name")?,
                    number: need(row.number, "open_wallet", "number")?,
                    channel: need(row.channel, "open_wallet", "channel")?,
                    kind: parse_kind::<WalletKind>(row.kind.as_deref())?
                        .unwrap_or(WalletKind::Agent),
                    balance: row.amount,
                },
            },
            Op::OpenOperator => Command::OpenOperator(NewOperator {
                number: OperatorNumber::from(need(row.key, "open_operator", "key")?),
                name: need(row.name, "open_operator", "name")?,
                balance: row.amount,
            }),
            Op::OpenClient => Command::OpenClient {
                reference: need(row.r#ref, "open_client", "ref")?,
                client: NewClient {
                    name: need(row.name, "open_client", "name")?,
                    phone: need(row.number, "open_client", "number")?,
                    total_sale: row.total,
                    paid: row.total.zip(row.due).map(|(total, due)| total - due),
                },
            },
            Op::AdjustBank => Command::AdjustBank {
                account: need(row.key, "adjust_bank", "key")?.into(),
                amount: need(row.amount, "adjust_bank", "amount")?,
            },
            Op::AdjustWallet => Command::AdjustWallet {
                wallet: need(row.wallet, "adjust_wallet", "wallet")?,
                amount: need(row.amount, "adjust_wallet", "amount")?,
            },
            Op::Transfer => Command::Transfer {
                reference: row.r#ref,
                request: TransferRequest {
                    account: need(row.key, "transfer", "key")?.into(),
                    kind: need(parse_kind(row.kind.as_deref())?, "transfer", "kind")?,
                    counterparty_name: need(row.name, "transfer", "name")?,
                    counterparty_account: row.number,
                    amount: need(row.amount, "transfer", "amount")?,
                    fee: row.fee,
                    pay: row.pay,
                    date: row.date,
                    time: None,
                },
            },
            Op::EditTransfer => Command::EditTransfer {
                reference: need(row.r#ref, "edit_transfer", "ref")?,
                patch: TransferPatch {
                    account: row.key.map(AccountNumber::from),
                    kind: parse_kind::<TransferKind>(row.kind.as_deref())?,
                    counterparty_name: row.name,
                    counterparty_account: row.number,
                    amount: row.amount,
                    fee: row.fee,
                    pay: row.pay,
                    date: row.date,
                    time: None,
                },
            },
            Op::DeleteTransfer => Command::DeleteTransfer {
                reference: need(row.r#ref, "delete_transfer", "ref")?,
            },
            Op::Recharge => Command::Recharge {
                reference: row.r#ref,
                request: RechargeRequest {
                    operator: need(row.key, "recharge", "key")?.into(),
                    receiver_number: need(row.number, "recharge", "number")?,
                    amount: need(row.amount, "recharge", "amount")?,
                    date: row.date,
                },
            },
            Op::EditRecharge => Command::EditRecharge {
                reference: need(row.r#ref, "edit_recharge", "ref")?,
                patch: RechargePatch {
                    operator: row.key.map(OperatorNumber::from),
                    receiver_number: row.number,
                    amount: row.amount,
                    date: row.date,
                },
            },
            Op::DeleteRecharge => Command::DeleteRecharge {
                reference: need(row.r#ref, "delete_recharge", "ref")?,
            },
            Op::Load => {
                let mut request = LoadRequest::new(
                    need(row.key, "load", "key")?,
                    need(row.amount, "load", "amount")?,
                )
                .recorded();
                request.date = row.date;
                Command::Load {
                    reference: row.r#ref,
                    request,
                }
            }
            Op::EditLoad => Command::EditLoad {
                reference: need(row.r#ref, "edit_load", "ref")?,
                patch: LoadPatch {
                    operator: row.key.map(OperatorNumber::from),
                    amount: row.amount,
                },
            },
            Op::DeleteLoad => Command::DeleteLoad {
                reference: need(row.r#ref, "delete_load", "ref")?,
            },
            Op::Daily => {
                let kind: DailyKind = need(parse_kind(row.kind.as_deref())?, "daily", "kind")?;
                let mut request = DailyRequest::new(
                    kind,
                    need(row.channel, "daily", "channel")?,
                    need(row.amount, "daily", "amount")?,
                );
                request.number = row.number;
                request.fee = row.fee;
                request.total = row.total;
                request.profit = row.profit;
                request.due = row.due;
                request.note = row.note;
                request.date = row.date;
                Command::Daily {
                    reference: row.r#ref,
                    wallet: row.wallet,
                    client: row.client,
                    request,
                }
            }
            Op::EditDaily => Command::EditDaily {
                reference: need(row.r#ref, "edit_daily", "ref")?,
                wallet: row.wallet,
                client: row.client,
                patch: DailyPatch {
                    date: row.date,
                    channel: row.channel,
                    number: row.number,
                    kind: parse_kind::<DailyKind>(row.kind.as_deref())?,
                    amount: row.amount,
                    fee: row.fee,
                    total: row.total,
                    profit: row.profit,
                    due: row.due,
                    note: row.note,
                    ..DailyPatch::default()
                },
            },
            Op::DeleteDaily => Command::DeleteDaily {
                reference: need(row.r#ref, "delete_daily", "ref")?,
            },
            Op::Payment => Command::Payment {
                client: need(row.client, "payment", "client")?,
                amount: need(row.amount, "payment", "amount")?,
            },
            Op::OpeningCash => Command::OpeningCash {
                date: row.date,
                amount: need(row.amount, "opening_cash", "amount")?,
            },
        };
        Ok(command)
    }
}
