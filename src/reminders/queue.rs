use crossbeam_channel::{Sender, unbounded};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

use super::ReminderDispatcher;
use crate::models::{ChoreId, ChoreRecord};

/// Unit of reminder work handed to the background worker
#[derive(Debug, Clone)]
pub enum ReminderJob {
    Schedule(ChoreRecord),
    Cancel(ChoreId),
    Resync(Vec<ChoreRecord>),
}

impl ReminderJob {
    fn name(&self) -> &'static str {
        match self {
            ReminderJob::Schedule(_) => "schedule",
            ReminderJob::Cancel(_) => "cancel",
            ReminderJob::Resync(_) => "resync",
        }
    }
}

/// Fire-and-forget reminder updates.
///
/// Record mutations return as soon as the job is queued; a single worker
/// thread applies jobs in submission order and only logs failures. Dropping
/// the queue drains what is left and joins the worker.
pub struct ReminderQueue {
    sender: Option<Sender<ReminderJob>>,
    worker: Option<JoinHandle<()>>,
    dispatcher: Arc<ReminderDispatcher>,
}

impl ReminderQueue {
    pub fn start(dispatcher: Arc<ReminderDispatcher>) -> Self {
        let (sender, receiver) = unbounded::<ReminderJob>();
        let worker_dispatcher = Arc::clone(&dispatcher);

        let worker = thread::Builder::new()
            .name("reminder-queue".to_string())
            .spawn(move || {
                for job in receiver.iter() {
                    run_job(&worker_dispatcher, job);
                }
                debug!("reminder queue drained");
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!(error = %e, "failed to start reminder worker, reminders will not be updated");
                None
            }
        };

        Self {
            sender: worker.as_ref().map(|_| sender),
            worker,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Arc<ReminderDispatcher> {
        &self.dispatcher
    }

    /// Queue a job; never blocks and never reports the job's outcome
    pub fn submit(&self, job: ReminderJob) {
        let Some(sender) = &self.sender else {
            warn!(job = job.name(), "reminder worker not running, dropping job");
            return;
        };
        if let Err(e) = sender.send(job) {
            warn!(job = e.into_inner().name(), "reminder worker gone, dropping job");
        }
    }

    pub fn schedule(&self, record: &ChoreRecord) {
        self.submit(ReminderJob::Schedule(record.clone()));
    }

    pub fn cancel(&self, id: ChoreId) {
        self.submit(ReminderJob::Cancel(id));
    }

    pub fn resync(&self, records: Vec<ChoreRecord>) {
        self.submit(ReminderJob::Resync(records));
    }

    /// Close the queue and wait until every submitted job has run
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("reminder worker panicked");
            }
        }
    }
}

impl Drop for ReminderQueue {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_job(dispatcher: &ReminderDispatcher, job: ReminderJob) {
    let result = match &job {
        ReminderJob::Schedule(record) => dispatcher.schedule_reminder(record),
        ReminderJob::Cancel(id) => dispatcher.cancel_reminder_for(id),
        ReminderJob::Resync(records) => dispatcher.resync_all(records).map(|_| ()),
    };
    if let Err(e) = result {
        warn!(job = job.name(), error = %e, "reminder update failed");
    }
}
