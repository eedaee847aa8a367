//! Selection-driven fetching.
//!
//! A [`Session`] turns "the user picked row N" into the two independent fetches
//! for that company and hands each result to a [`SelectionListener`]. It keeps
//! only the current selection and the cancellation handle of each in-flight
//! fetch; presentation state belongs to the listener.
//!
//! Picking a new row aborts whatever the previous row still had in flight, so a
//! slow response for an old selection never reaches the listener.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::future::{AbortHandle, Abortable};

use crate::catalog::{Catalog, Company};
use crate::error::{FetchError, SessionError};
use crate::fetcher::QuoteFetcher;
use crate::schema::Quote;

/// Receives fetch results. Called from a tokio worker, so implementations that
/// drive a UI must marshal onto their own thread.
///
/// The ticker is passed back so that a listener can match the result against
/// what it currently shows.
pub trait SelectionListener: Send + Sync {
    fn on_quote(&self, ticker: &str, result: Result<Quote, FetchError>);
    fn on_logo(&self, ticker: &str, result: Result<Bytes, FetchError>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Quote,
    Logo,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    abort: AbortHandle,
}

#[derive(Debug, Default)]
struct State {
    selected: Option<usize>,
    next_generation: u64,
    quote: Option<InFlight>,
    logo: Option<InFlight>,
}

impl State {
    fn slot_mut(&mut self, kind: FetchKind) -> &mut Option<InFlight> {
        match kind {
            FetchKind::Quote => &mut self.quote,
            FetchKind::Logo => &mut self.logo,
        }
    }

    fn cancel(&mut self, kind: FetchKind) {
        if let Some(in_flight) = self.slot_mut(kind).take() {
            in_flight.abort.abort();
        }
    }

    // clears the slot if `generation` still owns it
    fn finish(&mut self, kind: FetchKind, generation: u64) -> bool {
        let slot = self.slot_mut(kind);
        let owned = slot.as_ref().is_some_and(|f| f.generation == generation);
        if owned {
            *slot = None;
        }
        owned
    }
}

pub struct Session {
    catalog: Catalog,
    fetcher: QuoteFetcher,
    listener: Arc<dyn SelectionListener>,
    state: Arc<Mutex<State>>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new(
        catalog: Catalog,
        fetcher: QuoteFetcher,
        listener: Arc<dyn SelectionListener>,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            listener,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current(&self) -> Option<Company> {
        let selected = lock(&self.state).selected?;
        self.catalog.get(selected).copied()
    }

    /// Makes `index` the current selection and starts its quote and logo
    /// fetches, cancelling any still running for the previous selection.
    ///
    /// Must be called from within a tokio runtime.
    pub fn select(&self, index: usize) -> Result<Company, SessionError> {
        let company = *self
            .catalog
            .get(index)
            .ok_or(SessionError::IndexOutOfRange {
                index,
                count: self.catalog.count(),
            })?;

        log::info!("selected {} ({})", company.display_name, company.ticker);
        let mut state = lock(&self.state);
        state.selected = Some(index);
        self.start(&mut state, FetchKind::Quote, company.ticker);
        self.start(&mut state, FetchKind::Logo, company.ticker);
        Ok(company)
    }

    pub fn retry_quote(&self) -> Result<(), SessionError> {
        self.retry(FetchKind::Quote)
    }

    pub fn retry_logo(&self) -> Result<(), SessionError> {
        self.retry(FetchKind::Logo)
    }

    pub fn cancel_all(&self) {
        let mut state = lock(&self.state);
        state.cancel(FetchKind::Quote);
        state.cancel(FetchKind::Logo);
    }

    fn retry(&self, kind: FetchKind) -> Result<(), SessionError> {
        let mut state = lock(&self.state);
        let ticker = state
            .selected
            .and_then(|i| self.catalog.get(i))
            .map(|c| c.ticker)
            .ok_or(SessionError::NoSelection)?;

        log::info!("retrying {kind:?} for {ticker}");
        self.start(&mut state, kind, ticker);
        Ok(())
    }

    fn start(&self, state: &mut State, kind: FetchKind, ticker: &'static str) {
        state.cancel(kind);
        state.next_generation += 1;
        let generation = state.next_generation;

        let (abort, registration) = AbortHandle::new_pair();
        *state.slot_mut(kind) = Some(InFlight { generation, abort });

        let fetcher = self.fetcher.clone();
        let listener = Arc::clone(&self.listener);
        let shared = Arc::clone(&self.state);

        let task = async move {
            match kind {
                FetchKind::Quote => {
                    let result = fetcher.fetch_quote(ticker).await;
                    if lock(&shared).finish(kind, generation) {
                        listener.on_quote(ticker, result);
                    }
                }
                FetchKind::Logo => {
                    let result = fetcher.fetch_logo(ticker).await;
                    if lock(&shared).finish(kind, generation) {
                        listener.on_logo(ticker, result);
                    }
                }
            }
        };

        tokio::spawn(async move {
            if Abortable::new(task, registration).await.is_err() {
                log::debug!("{kind:?} fetch for {ticker} cancelled");
            }
        });
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
