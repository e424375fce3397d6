//! Registration, metadata upkeep and administrative balance overrides for
//! balance-bearing entities.

use rust_decimal::Decimal;
use tracing::info;

use crate::{
    domain::{
        AccountNumber, BalanceHolder, BankAccount, BankTransfer, Client, ClientId,
        DailyTransaction, LedgerEntry, META_ACCOUNT, Operator, OperatorNumber, WalletId,
        WalletKind, WalletNumber,
    },
    engine::{LedgerEngine, adjust, errors::EngineError, non_negative, required},
    store::{AtomicGroup, Record},
};

#[derive(Debug, Clone, PartialEq)]
pub struct NewBankAccount {
    pub account_number: AccountNumber,
    pub bank: String,
    pub branch: String,
    pub routing_no: Option<String>,
    pub account_name: String,
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWallet {
    pub label: String,
    pub number: String,
    pub channel: String,
    pub kind: WalletKind,
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOperator {
    pub number: OperatorNumber,
    pub name: String,
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    pub total_sale: Option<Decimal>,
    pub paid: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankAccountPatch {
    pub bank: Option<String>,
    pub branch: Option<String>,
    pub routing_no: Option<String>,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletPatch {
    pub label: Option<String>,
    pub number: Option<String>,
    pub channel: Option<String>,
    pub kind: Option<WalletKind>,
}

fn digits(field: &'static str, value: &str) -> Result<String, EngineError> {
    let value = required(field, value)?;
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(EngineError::validation(field, "must contain only digits"));
    }
    Ok(value)
}

fn opening(balance: Option<Decimal>) -> Result<Decimal, EngineError> {
    Ok(non_negative("balance", balance)?.unwrap_or(Decimal::ZERO))
}

fn ensure_unregistered<T: Record>(
    group: &mut AtomicGroup<'_>,
    field: &'static str,
    key: &T::Key,
) -> Result<(), EngineError> {
    if group.get::<T>(key).is_some() {
        return Err(EngineError::validation(
            field,
            format!("{} `{key}` is already registered", T::KIND),
        ));
    }
    Ok(())
}

/// Override shift that may not drive the balance below zero.
fn override_balance<T: Record + BalanceHolder>(
    group: &mut AtomicGroup<'_>,
    key: &T::Key,
    amount: Decimal,
) -> Result<T, EngineError> {
    let required = if amount.is_sign_negative() {
        -amount
    } else {
        Decimal::ZERO
    };
    adjust::shift::<T>(group, key, amount, required)
}

impl LedgerEngine {
    pub fn open_bank_account(&self, account: NewBankAccount) -> Result<BankAccount, EngineError> {
        let number =
            AccountNumber::from(required("account number", account.account_number.as_str())?);
        let mut group = self.begin();
        ensure_unregistered::<BankAccount>(&mut group, "account number", &number)?;
        let account = BankAccount {
            account_number: number,
            bank: required("bank", &account.bank)?,
            branch: required("branch", &account.branch)?,
            routing_no: account.routing_no,
            account_name: required("account name", &account.account_name)?,
            balance: opening(account.balance)?,
        };
        group.put(account.clone());
        group.commit()?;
        info!(account = %account.account_number, balance = %account.balance, "Bank account opened");
        Ok(account)
    }

    pub fn open_wallet(&self, wallet: NewWallet) -> Result<WalletNumber, EngineError> {
        let wallet = WalletNumber {
            id: WalletId::generate(),
            label: required("label", &wallet.label)?,
            number: digits("number", &wallet.number)?,
            channel: required("channel", &wallet.channel)?,
            kind: wallet.kind,
            balance: opening(wallet.balance)?,
        };
        let mut group = self.begin();
        group.put(wallet.clone());
        group.commit()?;
        info!(wallet = %wallet.id, number = %wallet.number, "Wallet opened");
        Ok(wallet)
    }

    pub fn open_operator(&self, operator: NewOperator) -> Result<Operator, EngineError> {
        let number = OperatorNumber::from(required("operator number", operator.number.as_str())?);
        let mut group = self.begin();
        ensure_unregistered::<Operator>(&mut group, "operator number", &number)?;
        let operator = Operator {
            number,
            name: required("name", &operator.name)?,
            balance: opening(operator.balance)?,
        };
        group.put(operator.clone());
        group.commit()?;
        info!(operator = %operator.number, balance = %operator.balance, "Operator opened");
        Ok(operator)
    }

    pub fn open_client(&self, client: NewClient) -> Result<Client, EngineError> {
        let total_sale = non_negative("total sale", client.total_sale)?.unwrap_or(Decimal::ZERO);
        let paid = non_negative("paid", client.paid)?.unwrap_or(Decimal::ZERO);
        if paid > total_sale {
            return Err(EngineError::validation("paid", "exceeds the total sale"));
        }
        let client = Client {
            id: ClientId::generate(),
            name: required("name", &client.name)?,
            phone: required("phone", &client.phone)?,
            total_sale,
            paid,
            due: total_sale - paid,
        };

        let mut group = self.begin();
        if group.find::<Client>(|c| c.phone == client.phone).is_some() {
            return Err(EngineError::validation(
                "phone",
                format!("a client with phone {} already exists", client.phone),
            ));
        }
        group.put(client.clone());
        group.commit()?;
        info!(client = %client.id, due = %client.due, "Client opened");
        Ok(client)
    }

    pub fn update_bank_account(
        &self,
        number: &AccountNumber,
        patch: BankAccountPatch,
    ) -> Result<BankAccount, EngineError> {
        let mut group = self.begin();
        let mut account = group.fetch::<BankAccount>(number)?;
        if let Some(bank) = patch.bank {
            account.bank = required("bank", &bank)?;
        }
        if let Some(branch) = patch.branch {
            account.branch = required("branch", &branch)?;
        }
        if let Some(routing_no) = patch.routing_no {
            account.routing_no = Some(routing_no);
        }
        if let Some(account_name) = patch.account_name {
            account.account_name = required("account name", &account_name)?;
        }
        group.put(account.clone());
        group.commit()?;
        Ok(account)
    }

    pub fn update_wallet(
        &self,
        id: WalletId,
        patch: WalletPatch,
    ) -> Result<WalletNumber, EngineError> {
        let mut group = self.begin();
        let mut wallet = group.fetch::<WalletNumber>(&id)?;
        if let Some(label) = patch.label {
            wallet.label = required("label", &label)?;
        }
        if let Some(number) = patch.number {
            wallet.number = digits("number", &number)?;
        }
        if let Some(channel) = patch.channel {
            wallet.channel = required("channel", &channel)?;
        }
        if let Some(kind) = patch.kind {
            wallet.kind = kind;
        }
        group.put(wallet.clone());
        group.commit()?;
        Ok(wallet)
    }

    pub fn update_operator(
        &self,
        number: &OperatorNumber,
        name: &str,
    ) -> Result<Operator, EngineError> {
        let mut group = self.begin();
        let mut operator = group.fetch::<Operator>(number)?;
        operator.name = required("name", name)?;
        group.put(operator.clone());
        group.commit()?;
        Ok(operator)
    }

    pub fn update_client(
        &self,
        id: ClientId,
        name: &str,
        phone: &str,
    ) -> Result<Client, EngineError> {
        let name = required("name", name)?;
        let phone = required("phone", phone)?;
        let mut group = self.begin();
        let mut client = group.fetch::<Client>(&id)?;
        if group
            .find::<Client>(|other| other.id != id && other.phone == phone)
            .is_some()
        {
            return Err(EngineError::validation(
                "phone",
                format!("a client with phone {phone} already exists"),
            ));
        }
        client.name = name;
        client.phone = phone;
        group.put(client.clone());
        group.commit()?;
        Ok(client)
    }

    /// Removes a bank account that no transfer or ledger entry references any
    /// more. Transfers look their account up by number, so deleting a
    /// referenced account would orphan them.
    pub fn delete_bank_account(&self, number: &AccountNumber) -> Result<BankAccount, EngineError> {
        let mut group = self.begin();
        let account = group.fetch::<BankAccount>(number)?;
        let referenced = group
            .find::<BankTransfer>(|transfer| transfer.account == *number)
            .is_some()
            || group
                .find::<LedgerEntry>(|entry| {
                    entry
                        .meta
                        .get(META_ACCOUNT)
                        .is_some_and(|account| account == number.as_str())
                })
                .is_some();
        if referenced {
            return Err(EngineError::validation(
                "account number",
                format!("bank account `{number}` still has transfers on record"),
            ));
        }
        group.remove::<BankAccount>(number);
        group.commit()?;
        info!(account = %number, balance = %account.balance, "Bank account deleted");
        Ok(account)
    }

    /// Removes a client no daily transaction or ledger entry references.
    pub fn delete_client(&self, id: ClientId) -> Result<Client, EngineError> {
        let mut group = self.begin();
        let client = group.fetch::<Client>(&id)?;
        let referenced = group
            .find::<DailyTransaction>(|txn| txn.client == Some(id))
            .is_some()
            || group
                .find::<LedgerEntry>(|entry| entry.client == Some(id))
                .is_some();
        if referenced {
            return Err(EngineError::validation(
                "client",
                format!("client `{id}` still has transactions on record"),
            ));
        }
        group.remove::<Client>(&id);
        group.commit()?;
        info!(client = %id, due = %client.due, "Client deleted");
        Ok(client)
    }

    /// Administrative deposit (positive) or withdrawal (negative) on a bank
    /// account. Leaves no ledger entry.
    pub fn adjust_bank_balance(
        &self,
        number: &AccountNumber,
        amount: Decimal,
    ) -> Result<BankAccount, EngineError> {
        let mut group = self.begin();
        let account = override_balance::<BankAccount>(&mut group, number, amount)?;
        group.commit()?;
        info!(account = %number, %amount, balance = %account.balance, "Bank balance adjusted");
        Ok(account)
    }

    /// Administrative top-up (positive) or draw-down (negative) on a wallet.
    pub fn adjust_wallet_balance(
        &self,
        id: WalletId,
        amount: Decimal,
    ) -> Result<WalletNumber, EngineError> {
        let mut group = self.begin();
        let wallet = override_balance::<WalletNumber>(&mut group, &id, amount)?;
        group.commit()?;
        info!(wallet = %id, %amount, balance = %wallet.balance, "Wallet balance adjusted");
        Ok(wallet)
    }

    pub fn bank_account(&self, number: &AccountNumber) -> Option<BankAccount> {
        self.store.read(|tables| tables.get::<BankAccount>(number).cloned())
    }

    pub fn wallet(&self, id: WalletId) -> Option<WalletNumber> {
        self.store.read(|tables| tables.get::<WalletNumber>(&id).cloned())
    }

    pub fn operator(&self, number: &OperatorNumber) -> Option<Operator> {
        self.store.read(|tables| tables.get::<Operator>(number).cloned())
    }

    pub fn client(&self, id: ClientId) -> Option<Client> {
        self.store.read(|tables| tables.get::<Client>(&id).cloned())
    }

    /// Bank accounts ordered by account number.
    pub fn bank_accounts(&self) -> Vec<BankAccount> {
        self.store.read(|tables| {
            let mut accounts: Vec<_> = tables.all::<BankAccount>().cloned().collect();
            accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
            accounts
        })
    }

    /// Wallets ordered by label, then number.
    pub fn wallets(&self) -> Vec<WalletNumber> {
        self.store.read(|tables| {
            let mut wallets: Vec<_> = tables.all::<WalletNumber>().cloned().collect();
            wallets.sort_by(|a, b| (&a.label, &a.number).cmp(&(&b.label, &b.number)));
            wallets
        })
    }

    pub fn operators(&self) -> Vec<Operator> {
        self.store.read(|tables| {
            let mut operators: Vec<_> = tables.all::<Operator>().cloned().collect();
            operators.sort_by(|a, b| a.number.cmp(&b.number));
            operators
        })
    }

    /// Clients ordered by name, then phone.
    pub fn clients(&self) -> Vec<Client> {
        self.store.read(|tables| {
            let mut clients: Vec<_> = tables.all::<Client>().cloned().collect();
            clients.sort_by(|a, b| (&a.name, &a.phone).cmp(&(&b.name, &b.phone)));
            clients
        })
    }
}
