//! Calling-convention shim for Modbus client libraries
//!
//! Client libraries name the unit identifier differently (`slave`, `unit`,
//! `slave_id`, `device_id`) or take it positionally, and releases move between
//! these. Each request is tried against a fixed ladder of conventions; the
//! first one the client accepts wins. Only signature mismatches advance the
//! ladder. Any other failure is returned to the caller unchanged.

use super::modbus_like::{CallError, CallShape, ModbusLike, ReadRequest, WriteRequest};
use crate::error::{Result, VoolError};
use crate::logging::get_logger;

/// Conventions tried in order before the identifier-less fallback
pub const CALL_LADDER: [CallShape; 7] = [
    CallShape::NamedSlave,
    CallShape::NamedUnit,
    CallShape::NamedSlaveId,
    CallShape::NamedDeviceId,
    CallShape::NamedWithoutId,
    CallShape::PositionalWithId,
    CallShape::PositionalWithoutId,
];

#[derive(Debug, Clone, Copy)]
enum Operation {
    Read(ReadRequest),
    Write(WriteRequest),
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Self::Read(_) => "read_holding_registers",
            Self::Write(_) => "write_register",
        }
    }
}

enum Outcome {
    Words(Vec<u16>),
    Written,
}

async fn call_once(
    client: &mut dyn ModbusLike,
    shape: CallShape,
    op: Operation,
) -> std::result::Result<Outcome, CallError> {
    match op {
        Operation::Read(request) => client
            .read_holding_registers(shape, request)
            .await
            .map(Outcome::Words),
        Operation::Write(request) => client
            .write_register(shape, request)
            .await
            .map(|()| Outcome::Written),
    }
}

async fn call_with_ladder(client: &mut dyn ModbusLike, op: Operation) -> Result<Outcome> {
    let logger = get_logger("compat");

    for shape in CALL_LADDER {
        match call_once(client, shape, op).await {
            Ok(outcome) => {
                if !shape.carries_unit_id() {
                    logger.debug(&format!(
                        "{} accepted '{}' convention; unit id not forwarded",
                        op.name(),
                        shape
                    ));
                }
                return Ok(outcome);
            }
            Err(CallError::Signature(reason)) => {
                logger.trace(&format!(
                    "{} rejected '{}' convention: {}",
                    op.name(),
                    shape,
                    reason
                ));
            }
            Err(CallError::Failed(err)) => return Err(err),
        }
    }

    logger.warn(&format!(
        "Client {} does not accept unit/slave id in any known form; falling back to default unit id",
        op.name()
    ));

    match call_once(client, CallShape::NamedWithoutId, op).await {
        Ok(outcome) => Ok(outcome),
        Err(CallError::Failed(err)) => Err(err),
        Err(CallError::Signature(reason)) => Err(VoolError::compatibility(
            op.name(),
            format!("no supported calling convention: {}", reason),
        )),
    }
}

/// Read `count` holding registers starting at `address` on `unit_id`
pub async fn read_holding_registers(
    client: &mut dyn ModbusLike,
    address: u16,
    count: u16,
    unit_id: u8,
) -> Result<Vec<u16>> {
    let request = ReadRequest {
        address,
        count,
        unit_id,
    };
    match call_with_ladder(client, Operation::Read(request)).await? {
        Outcome::Words(words) => Ok(words),
        Outcome::Written => Err(VoolError::compatibility(
            "read_holding_registers",
            "client returned a write acknowledgement for a read",
        )),
    }
}

/// Write `value` to the holding register at `address` on `unit_id`
pub async fn write_register(
    client: &mut dyn ModbusLike,
    address: u16,
    value: u16,
    unit_id: u8,
) -> Result<()> {
    let request = WriteRequest {
        address,
        value,
        unit_id,
    };
    match call_with_ladder(client, Operation::Write(request)).await? {
        Outcome::Written => Ok(()),
        Outcome::Words(_) => Err(VoolError::compatibility(
            "write_register",
            "client returned register words for a write",
        )),
    }
}
