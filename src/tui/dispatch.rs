//! Bridge between the synchronous UI loop and async network calls.
//!
//! Requests run on a tokio runtime owned here; results come back over a
//! channel and are drained once per frame on the UI thread.

use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::models::{AddCaffeinePayload, DailySummaryRequest, Ticket};
use crate::stats::{StatsPeriod, StatsSeries};

#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    AddCaffeine(AddCaffeinePayload),
    SleepGoal(NaiveDate),
    /// The date is the home day the goal was edited on
    SetSleepGoal(NaiveDate, NaiveTime),
    ConditionTemp(NaiveDate),
    DailySummary(NaiveDate, DailySummaryRequest),
    Stats(StatsSeries, StatsPeriod),
}

/// Requests of the same kind supersede each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    AddCaffeine,
    SleepGoal,
    SetSleepGoal,
    ConditionTemp,
    DailySummary,
    Stats(StatsSeries),
}

impl ApiRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            ApiRequest::AddCaffeine(_) => RequestKind::AddCaffeine,
            ApiRequest::SleepGoal(_) => RequestKind::SleepGoal,
            ApiRequest::SetSleepGoal(..) => RequestKind::SetSleepGoal,
            ApiRequest::ConditionTemp(_) => RequestKind::ConditionTemp,
            ApiRequest::DailySummary(..) => RequestKind::DailySummary,
            ApiRequest::Stats(series, _) => RequestKind::Stats(*series),
        }
    }
}

#[derive(Debug)]
pub enum ApiResponse {
    AddCaffeine(Result<(), ApiError>),
    SleepGoal(Result<NaiveTime, ApiError>),
    SetSleepGoal(NaiveDate, NaiveTime, Result<(), ApiError>),
    ConditionTemp(Result<Option<f64>, ApiError>),
    DailySummary(NaiveDate, Result<serde_json::Value, ApiError>),
    Stats(StatsSeries, StatsPeriod, Result<serde_json::Value, ApiError>),
}

#[derive(Debug)]
pub struct Completed {
    pub ticket: Ticket,
    pub response: ApiResponse,
}

async fn execute(client: ApiClient, request: ApiRequest) -> ApiResponse {
    match request {
        ApiRequest::AddCaffeine(payload) => {
            ApiResponse::AddCaffeine(client.add_caffeine(&payload).await.map(|_| ()))
        }
        ApiRequest::SleepGoal(date) => ApiResponse::SleepGoal(client.sleep_goal(date).await),
        ApiRequest::SetSleepGoal(date, goal) => {
            ApiResponse::SetSleepGoal(date, goal, client.set_sleep_goal(goal).await)
        }
        ApiRequest::ConditionTemp(date) => {
            ApiResponse::ConditionTemp(client.condition_temp(date).await)
        }
        ApiRequest::DailySummary(date, body) => {
            ApiResponse::DailySummary(date, client.daily_summary(&body).await)
        }
        ApiRequest::Stats(series, period) => {
            ApiResponse::Stats(series, period, client.stats(series, period).await)
        }
    }
}

pub struct Dispatcher {
    runtime: Runtime,
    sender: Sender<Completed>,
    receiver: Receiver<Completed>,
    tasks: HashMap<Ticket, JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            runtime,
            sender,
            receiver,
            tasks: HashMap::new(),
        })
    }

    /// Spawn `request`; its result arrives through [`Dispatcher::drain`].
    pub fn dispatch(&mut self, client: &ApiClient, ticket: Ticket, request: ApiRequest) {
        debug!(ticket = ticket.value(), kind = ?request.kind(), "dispatching request");
        let client = client.clone();
        let sender = self.sender.clone();
        let handle = self.runtime.spawn(async move {
            let response = execute(client, request).await;
            // The receiver only goes away on shutdown
            let _ = sender.send(Completed { ticket, response });
        });
        self.tasks.insert(ticket, handle);
    }

    /// Abort an in-flight request; nothing is delivered for it afterwards
    /// unless it had already finished.
    pub fn abort(&mut self, ticket: Ticket) {
        if let Some(handle) = self.tasks.remove(&ticket) {
            debug!(ticket = ticket.value(), "aborting request");
            handle.abort();
        }
    }

    /// Collect every result that has arrived since the last call
    pub fn drain(&mut self) -> Vec<Completed> {
        let completed: Vec<Completed> = self.receiver.try_iter().collect();
        for item in &completed {
            self.tasks.remove(&item.ticket);
        }
        self.tasks.retain(|_, handle| !handle.is_finished());
        completed
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}
