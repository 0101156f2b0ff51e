//! Scripted callers shared by the unit tests.

use std::sync::{Arc, Mutex};

use dc_core::{DataResponse, ResponseError, SourceParams, SourceType};
use dc_source::{DataSource, ErrorCallback, SourceCaller, SuccessCallback};

/// How a [`ScriptedCaller`] answers each call.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    /// Keep the callbacks until the test completes them.
    Pending,
    /// Succeed immediately with this value.
    Ok(u32),
    /// Fail immediately with this HTTP status.
    Err(u16),
}

type PendingCall = (ErrorCallback, SuccessCallback<u32>);

pub struct ScriptedCaller {
    origin: SourceType,
    reply: Reply,
    calls: Mutex<Vec<SourceParams>>,
    pending: Mutex<Vec<PendingCall>>,
}

impl ScriptedCaller {
    pub fn new(origin: SourceType, reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            origin,
            reply,
            calls: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_params(&self) -> SourceParams {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }

    pub fn succeed(&self, data: u32) {
        let (_, on_success) = self.pending.lock().unwrap().remove(0);
        on_success(DataResponse::new(data, self.origin));
    }

    pub fn fail(&self, status: u16) {
        let (on_error, _) = self.pending.lock().unwrap().remove(0);
        on_error(http_error(status));
    }
}

impl SourceCaller<u32> for ScriptedCaller {
    fn get(&self, params: SourceParams, on_error: ErrorCallback, on_success: SuccessCallback<u32>) {
        self.calls.lock().unwrap().push(params.clone());
        match self.reply {
            Reply::Pending => self.pending.lock().unwrap().push((on_error, on_success)),
            Reply::Ok(data) => on_success(DataResponse::new(data, self.origin).with_params(params)),
            Reply::Err(status) => on_error(http_error(status)),
        }
    }

    fn cancel(&self) {
        self.pending.lock().unwrap().clear();
    }
}

pub fn http_error(status: u16) -> ResponseError {
    ResponseError::Http {
        status,
        message: format!("status {}", status),
    }
}

pub fn reply_source(origin: SourceType, reply: Reply) -> DataSource<u32> {
    DataSource::<u32>::builder(ScriptedCaller::new(origin, reply), origin).build()
}

/// A handler collecting everything it is called with.
pub fn collect<V: Send + 'static>() -> (Arc<Mutex<Vec<V>>>, impl Fn(V) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |v: V| sink.lock().unwrap().push(v))
}
