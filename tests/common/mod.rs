//! In-memory charger used by the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vool_modbus::config::{Config, ModbusConfig};
use vool_modbus::driver::ChargerDriver;
use vool_modbus::error::VoolError;
use vool_modbus::modbus::{
    CallError, CallResult, CallShape, ClientFactory, ModbusLike, ReadRequest, WriteRequest,
};

#[derive(Default)]
pub struct ChargerState {
    pub registers: HashMap<u16, u16>,
    /// Block base address -> error produced by a read of that block
    pub read_errors: HashMap<u16, fn() -> VoolError>,
    pub write_error: Option<fn() -> VoolError>,
    pub refuse_connect: bool,
    /// Only this calling convention is understood; `None` accepts all
    pub accepted_shape: Option<CallShape>,
    /// Client understands no calling convention at all
    pub reject_all_shapes: bool,
    pub handshakes: usize,
    pub closes: usize,
    pub reads: Vec<ReadRequest>,
    pub writes: Vec<WriteRequest>,
    pub shapes_seen: Vec<CallShape>,
}

#[derive(Clone, Default)]
pub struct FakeCharger {
    pub state: Arc<Mutex<ChargerState>>,
}

impl FakeCharger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charger with the status words from the end-to-end example and a
    /// readable energy counter and control block.
    pub fn plugged_in() -> Self {
        let fake = Self::new();
        fake.load(100, &[2, 7, 100, 0xFFCE, 1600, 2301, 2299, 2302, 370, 120, 125, 125]);
        fake.load(200, &[0, 1234]);
        fake.load(500, &[1, 600, 7]);
        fake
    }

    pub fn load(&self, base: u16, words: &[u16]) {
        let mut state = self.state.lock().unwrap();
        for (i, w) in words.iter().enumerate() {
            state.registers.insert(base + i as u16, *w);
        }
    }

    pub fn fail_reads_at(&self, base: u16, err: fn() -> VoolError) {
        self.state.lock().unwrap().read_errors.insert(base, err);
    }

    pub fn heal_reads_at(&self, base: u16) {
        self.state.lock().unwrap().read_errors.remove(&base);
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ChargerState) -> R) -> R {
        let mut guard = self.state.lock().unwrap();
        f(&mut *guard)
    }

    pub fn driver(&self) -> ChargerDriver {
        ChargerDriver::with_client_factory(Config::default(), Arc::new(self.clone()))
    }

    pub fn status_reads(&self) -> usize {
        self.with(|s| s.reads.iter().filter(|r| r.address == 100).count())
    }
}

struct FakeClient {
    state: Arc<Mutex<ChargerState>>,
}

impl FakeClient {
    fn check_shape(state: &mut ChargerState, shape: CallShape) -> CallResult<()> {
        state.shapes_seen.push(shape);
        if state.reject_all_shapes {
            return Err(CallError::Signature(format!("unexpected keyword for {}", shape)));
        }
        match state.accepted_shape {
            Some(accepted) if accepted != shape => {
                Err(CallError::Signature(format!("unexpected keyword for {}", shape)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ModbusLike for FakeClient {
    async fn connect(&mut self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.handshakes += 1;
        !state.refuse_connect
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closes += 1;
    }

    async fn read_holding_registers(
        &mut self,
        shape: CallShape,
        request: ReadRequest,
    ) -> CallResult<Vec<u16>> {
        let mut state = self.state.lock().unwrap();
        Self::check_shape(&mut state, shape)?;
        state.reads.push(request);
        if let Some(err) = state.read_errors.get(&request.address) {
            return Err(CallError::Failed(err()));
        }
        Ok((request.address..request.address + request.count)
            .map(|a| state.registers.get(&a).copied().unwrap_or(0))
            .collect())
    }

    async fn write_register(&mut self, shape: CallShape, request: WriteRequest) -> CallResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_shape(&mut state, shape)?;
        state.writes.push(request);
        if let Some(err) = state.write_error {
            return Err(CallError::Failed(err()));
        }
        state.registers.insert(request.address, request.value);
        Ok(())
    }
}

impl ClientFactory for FakeCharger {
    fn create(&self, _config: &ModbusConfig, _timeout: Duration) -> Box<dyn ModbusLike> {
        Box::new(FakeClient {
            state: Arc::clone(&self.state),
        })
    }
}
