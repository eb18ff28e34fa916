//! In-memory identity provider.
//!
//! [`MemoryAuthDirectory`] owns the accounts and acts as the
//! [`AuthConnector`]; each connection yields a [`MemoryAuthClient`] with its
//! own sign-in state. Passwords are stored as salted SHA-256 digests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::ports::{
    AuthConnector, AuthProvider, AuthProviderError, Subscription, Unsubscribe,
};
use crate::domain::validation::{PASSWORD_MIN, validate_email};
use crate::domain::{AuthErrorCode, Codename, Credentials, User, UserId};

/// Consecutive failed sign-ins after which an account is throttled.
pub const MAX_FAILED_SIGN_INS: u32 = 5;

struct Account {
    id: UserId,
    email: String,
    salt: String,
    digest: String,
    display_name: Option<Codename>,
    failed_sign_ins: u32,
}

impl Account {
    fn user(&self) -> User {
        User {
            id: self.id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }

    fn verify(&self, password: &str) -> bool {
        digest(&self.salt, password) == self.digest
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn new_salt() -> String {
    let mut bytes = Zeroizing::new([0_u8; 16]);
    rand::thread_rng().fill_bytes(&mut bytes[..]);
    hex::encode(&bytes[..])
}

fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
}

impl Accounts {
    fn by_id(&self, id: &UserId) -> Option<&Account> {
        self.by_email.values().find(|account| &account.id == id)
    }

    fn by_id_mut(&mut self, id: &UserId) -> Option<&mut Account> {
        self.by_email.values_mut().find(|account| &account.id == id)
    }
}

/// Account directory shared by every client.
///
/// Cloning yields another handle onto the same accounts.
#[derive(Clone, Default)]
pub struct MemoryAuthDirectory {
    accounts: Arc<Mutex<Accounts>>,
}

impl MemoryAuthDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a signed-out client.
    #[must_use]
    pub fn client(&self) -> MemoryAuthClient {
        MemoryAuthClient::new(self.clone(), None)
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.lock().by_email.len()
    }

    fn lock(&self) -> MutexGuard<'_, Accounts> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, credentials: &Credentials) -> Result<User, AuthProviderError> {
        if validate_email(credentials.email()).is_err() {
            return Err(AuthProviderError::rejected_with(&AuthErrorCode::InvalidEmail));
        }
        if credentials.password().chars().count() < PASSWORD_MIN {
            return Err(AuthProviderError::rejected_with(&AuthErrorCode::WeakPassword));
        }
        let email = normalise_email(credentials.email());
        let mut accounts = self.lock();
        if accounts.by_email.contains_key(&email) {
            return Err(AuthProviderError::rejected_with(
                &AuthErrorCode::EmailAlreadyInUse,
            ));
        }
        let id = UserId::new(Uuid::new_v4().simple().to_string())
            .map_err(|err| AuthProviderError::unavailable(err.to_string()))?;
        let salt = new_salt();
        let account = Account {
            id,
            email: credentials.email().trim().to_owned(),
            digest: digest(&salt, credentials.password()),
            salt,
            display_name: None,
            failed_sign_ins: 0,
        };
        let user = account.user();
        accounts.by_email.insert(email, account);
        info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<User, AuthProviderError> {
        let mut accounts = self.lock();
        let Some(account) = accounts
            .by_email
            .get_mut(&normalise_email(credentials.email()))
        else {
            return Err(AuthProviderError::rejected_with(
                &AuthErrorCode::InvalidCredential,
            ));
        };
        if account.failed_sign_ins >= MAX_FAILED_SIGN_INS {
            warn!(user_id = %account.id, "sign-in throttled");
            return Err(AuthProviderError::rejected_with(
                &AuthErrorCode::TooManyRequests,
            ));
        }
        if !account.verify(credentials.password()) {
            account.failed_sign_ins += 1;
            return Err(AuthProviderError::rejected_with(
                &AuthErrorCode::InvalidCredential,
            ));
        }
        account.failed_sign_ins = 0;
        Ok(account.user())
    }

    fn rename(&self, id: &UserId, name: &Codename) -> Result<User, AuthProviderError> {
        let mut accounts = self.lock();
        let account = accounts
            .by_id_mut(id)
            .ok_or_else(AuthProviderError::signed_out)?;
        account.display_name = Some(name.clone());
        Ok(account.user())
    }

    fn find(&self, id: &UserId) -> Option<User> {
        self.lock().by_id(id).map(Account::user)
    }
}

#[async_trait]
impl AuthConnector for MemoryAuthDirectory {
    async fn connect(
        &self,
        persisted: Option<UserId>,
    ) -> Result<Arc<dyn AuthProvider>, AuthProviderError> {
        let restored = persisted.as_ref().and_then(|id| self.find(id));
        if persisted.is_some() && restored.is_none() {
            debug!("persisted session refers to an unknown account");
        }
        Ok(Arc::new(MemoryAuthClient::new(self.clone(), restored)))
    }
}

type UserFeed = UnboundedSender<Option<User>>;

#[derive(Default)]
struct ClientState {
    current: Option<User>,
    listeners: HashMap<u64, UserFeed>,
    next_listener: u64,
}

impl ClientState {
    fn publish(&mut self, user: Option<User>) {
        self.current = user;
        let current = self.current.clone();
        self.listeners
            .retain(|_, feed| feed.send(current.clone()).is_ok());
    }
}

/// One client session against a [`MemoryAuthDirectory`].
pub struct MemoryAuthClient {
    directory: MemoryAuthDirectory,
    state: Arc<Mutex<ClientState>>,
}

impl MemoryAuthClient {
    fn new(directory: MemoryAuthDirectory, current: Option<User>) -> Self {
        Self {
            directory,
            state: Arc::new(Mutex::new(ClientState {
                current,
                ..ClientState::default()
            })),
        }
    }

    /// Signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.lock().current.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthClient {
    fn subscribe(&self) -> Subscription<Option<User>> {
        let mut state = self.lock();
        let (feed, receiver) = tokio::sync::mpsc::unbounded_channel();
        if feed.send(state.current.clone()).is_err() {
            debug!("initial auth state undelivered");
        }
        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.insert(id, feed);
        drop(state);

        let weak: Weak<Mutex<ClientState>> = Arc::downgrade(&self.state);
        Subscription::new(
            receiver,
            Unsubscribe::new(move || {
                if let Some(state) = weak.upgrade() {
                    state
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .listeners
                        .remove(&id);
                }
            }),
        )
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthProviderError> {
        let user = self.directory.authenticate(credentials)?;
        self.lock().publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<User, AuthProviderError> {
        let user = self.directory.register(credentials)?;
        self.lock().publish(Some(user.clone()));
        Ok(user)
    }

    async fn set_display_name(&self, name: &Codename) -> Result<(), AuthProviderError> {
        let id = self
            .current_user()
            .map(|user| user.id)
            .ok_or_else(AuthProviderError::signed_out)?;
        let user = self.directory.rename(&id, name)?;
        self.lock().publish(Some(user));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthProviderError> {
        self.lock().publish(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Behavioural coverage for the in-memory identity provider.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn directory() -> MemoryAuthDirectory {
        MemoryAuthDirectory::new()
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials::from_parts(email, password)
    }

    #[rstest]
    #[tokio::test]
    async fn sign_up_then_sign_in_on_another_client(directory: MemoryAuthDirectory) {
        let first = directory.client();
        let created = first
            .sign_up(&credentials("Ada@Example.com", "hunter22"))
            .await
            .expect("registered");
        first
            .set_display_name(&Codename::new("SlyFoxDances").expect("codename"))
            .await
            .expect("renamed");

        let second = directory.client();
        let signed_in = second
            .sign_in(&credentials("ada@example.com", "hunter22"))
            .await
            .expect("signed in");
        assert_eq!(signed_in.id, created.id);
        assert_eq!(
            signed_in.display_name.as_ref().map(Codename::as_str),
            Some("SlyFoxDances")
        );
    }

    #[rstest]
    #[case("ada@example.com", "hunter22", AuthErrorCode::EmailAlreadyInUse)]
    #[case("not-an-email", "hunter22", AuthErrorCode::InvalidEmail)]
    #[case("bob@example.com", "12345", AuthErrorCode::WeakPassword)]
    #[tokio::test]
    async fn sign_up_rejections_carry_codes(
        directory: MemoryAuthDirectory,
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: AuthErrorCode,
    ) {
        directory
            .client()
            .sign_up(&credentials("ada@example.com", "hunter22"))
            .await
            .expect("seed account");
        let err = directory
            .client()
            .sign_up(&credentials(email, password))
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), Some(expected));
        assert_eq!(directory.account_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_failures_are_throttled(directory: MemoryAuthDirectory) {
        let client = directory.client();
        client
            .sign_up(&credentials("ada@example.com", "hunter22"))
            .await
            .expect("registered");
        for _ in 0..MAX_FAILED_SIGN_INS {
            let err = client
                .sign_in(&credentials("ada@example.com", "wrong!"))
                .await
                .expect_err("wrong password");
            assert_eq!(err.code(), Some(AuthErrorCode::InvalidCredential));
        }
        let err = client
            .sign_in(&credentials("ada@example.com", "hunter22"))
            .await
            .expect_err("throttled");
        assert_eq!(err.code(), Some(AuthErrorCode::TooManyRequests));
    }

    #[rstest]
    #[tokio::test]
    async fn subscribers_see_current_state_then_changes(directory: MemoryAuthDirectory) {
        let client = directory.client();
        let mut feed = client.subscribe();
        assert_eq!(feed.next().await, Some(None));

        let user = client
            .sign_up(&credentials("ada@example.com", "hunter22"))
            .await
            .expect("registered");
        assert_eq!(feed.next().await, Some(Some(user)));

        client.sign_out().await.expect("signed out");
        assert_eq!(feed.next().await, Some(None));
    }

    #[rstest]
    #[tokio::test]
    async fn connect_restores_known_accounts_only(directory: MemoryAuthDirectory) {
        let user = directory
            .client()
            .sign_up(&credentials("ada@example.com", "hunter22"))
            .await
            .expect("registered");

        let restored = directory
            .connect(Some(user.id.clone()))
            .await
            .expect("connected");
        assert_eq!(restored.subscribe().try_next(), Some(Some(user)));

        let stranger = directory
            .connect(Some(UserId::new("ghost").expect("id")))
            .await
            .expect("connected");
        assert_eq!(stranger.subscribe().try_next(), Some(None));
    }

    #[rstest]
    #[tokio::test]
    async fn renaming_requires_a_signed_in_user(directory: MemoryAuthDirectory) {
        let err = directory
            .client()
            .set_display_name(&Codename::new("Nobody").expect("codename"))
            .await
            .expect_err("signed out");
        assert_eq!(err, AuthProviderError::signed_out());
    }

    #[rstest]
    fn dropping_a_subscription_removes_the_listener(directory: MemoryAuthDirectory) {
        let client = directory.client();
        let feed = client.subscribe();
        assert_eq!(client.lock().listeners.len(), 1);
        drop(feed);
        assert!(client.lock().listeners.is_empty());
    }

    #[rstest]
    fn digests_are_salted() {
        assert_ne!(digest("a", "pw"), digest("b", "pw"));
        assert_eq!(digest("a", "pw").len(), 64);
    }
}
