/*! The two verification-oriented finite state machines: Get (read) and
Set (write-then-verify).

Both are driven purely against the [`Transport`] capability and the
[`FieldType`] decoder schedule; neither retains state across calls; a
fresh call is required per operation.
*/
use log::{debug, info, trace, warn};

use crate::assertion::{self, Assertion};
use crate::decode::{self, FieldType, FieldValue};
use crate::error::{Error, Result};
use crate::frame;
use crate::transport::Transport;

/// Retry limit shared by every stage (ACK wait, data wait, verify
/// assertion).
const RETRY_LIMIT: u32 = 10;

enum Phase {
    WaitAck,
    WaitData,
}

/// Drive the ack-then-data sub-transaction shared by the Get FSM and
/// both read phases of the Set FSM: wait for ACK, read the decoder
/// schedule, optionally verify the trailing CRC8. `framed` is
/// retransmitted whenever a timeout triggers a retry.
fn run_ack_and_data_phase(
    transport: &mut dyn Transport,
    framed: &[u8],
    decoders: &[FieldType],
    rx_crc: bool,
    ack_limit_label: &'static str,
    data_limit_label: &'static str,
) -> Result<(Vec<FieldValue>, Vec<u8>)> {
    let mut phase = Phase::WaitAck;
    let mut ack_retries = 0u32;
    let mut data_retries = 0u32;
    loop {
        match phase {
            Phase::WaitAck => {
                trace!("wait_ack");
                match transport.read_one() {
                    Ok(0x06) => phase = Phase::WaitData,
                    Ok(0x15) => {
                        warn!("comms_failure(nak_rx)");
                        return Err(Error::NakReceived);
                    }
                    Ok(other) => return Err(Error::UnexpectedByte(other)),
                    Err(Error::TransportTimeout) => {
                        ack_retries += 1;
                        debug!("ack timeout, retry {ack_retries}/{RETRY_LIMIT}");
                        if ack_retries >= RETRY_LIMIT {
                            warn!("{ack_limit_label}");
                            return Err(Error::Protocol(ack_limit_label));
                        }
                        transport.write(framed)?;
                    }
                    Err(e) => return Err(e),
                }
            }
            Phase::WaitData => {
                trace!("wait_data");
                let mut fields = Vec::with_capacity(decoders.len());
                let mut raw = Vec::new();
                let mut timed_out = false;
                for &kind in decoders {
                    match decode::decode_field(transport, kind) {
                        Ok((v, r)) => {
                            fields.push(v);
                            raw.extend(r);
                        }
                        Err(Error::TransportTimeout) => {
                            timed_out = true;
                            break;
                        }
                        Err(e) => return Err(e),
                    }
                }
                if !timed_out && rx_crc {
                    match transport.read_one() {
                        Ok(crc) => {
                            if !frame::decode_trailer_crc(&raw, crc) {
                                return Err(Error::CrcMismatch);
                            }
                        }
                        Err(Error::TransportTimeout) => timed_out = true,
                        Err(e) => return Err(e),
                    }
                }
                if timed_out {
                    data_retries += 1;
                    debug!("data timeout, retry {data_retries}/{RETRY_LIMIT}");
                    if data_retries >= RETRY_LIMIT {
                        warn!("{data_limit_label}");
                        return Err(Error::Protocol(data_limit_label));
                    }
                    transport.write(framed)?;
                    phase = Phase::WaitAck;
                    continue;
                }
                return Ok((fields, raw));
            }
        }
    }
}

/// Run a Get transaction: open the transport, send `payload`, and
/// decode `decoders`. Closes the transport on every terminal state.
pub fn run_get_fsm(
    transport: &mut dyn Transport,
    payload: &str,
    decoders: &[FieldType],
    tx_crc: bool,
    rx_crc: bool,
) -> Result<(Vec<FieldValue>, Vec<u8>)> {
    transport.open()?;
    debug!("comms_start: get {payload:?}");
    let framed = frame::encode(payload, tx_crc);
    let result = transport.write(&framed).and_then(|()| {
        run_ack_and_data_phase(
            transport,
            &framed,
            decoders,
            rx_crc,
            "comms_failure(retry_get_ack>limit)",
            "comms_failure(retry_get_data>limit)",
        )
    });
    match &result {
        Ok(_) => info!("get_cmd_ok: {payload:?}"),
        Err(e) => warn!("get fsm terminated: {e}"),
    }
    transport.close();
    result
}

/// Run a Set transaction: write the set-command, then read back via
/// the get-command and evaluate `assertion` against the result. On
/// ACK loss the verify path is taken directly; on assertion mismatch
/// the verify path retries up to [`RETRY_LIMIT`] times.
pub fn run_set_fsm(
    transport: &mut dyn Transport,
    set_payload: &str,
    get_payload: &str,
    decoders: &[FieldType],
    assertion: &Assertion,
    tx_crc: bool,
    rx_crc: bool,
) -> Result<(Vec<FieldValue>, Vec<u8>)> {
    transport.open()?;
    debug!("comms_start: set {set_payload:?}");
    let result = run_set_fsm_inner(
        transport,
        set_payload,
        get_payload,
        decoders,
        assertion,
        tx_crc,
        rx_crc,
    );
    match &result {
        Ok(_) => info!("set_cmd_ok: {set_payload:?}"),
        Err(e) => warn!("set fsm terminated: {e}"),
    }
    transport.close();
    result
}

fn run_set_fsm_inner(
    transport: &mut dyn Transport,
    set_payload: &str,
    get_payload: &str,
    decoders: &[FieldType],
    assertion: &Assertion,
    tx_crc: bool,
    rx_crc: bool,
) -> Result<(Vec<FieldValue>, Vec<u8>)> {
    let set_framed = frame::encode(set_payload, tx_crc);
    let get_framed = frame::encode(get_payload, tx_crc);
    let mut verify_retries = 0u32;

    transport.write(&set_framed)?;
    loop {
        trace!("wait_set_ack");
        match transport.read_one() {
            Ok(0x06) => {
                transport.write(&get_framed)?;
                let (fields, raw) = run_ack_and_data_phase(
                    transport,
                    &get_framed,
                    decoders,
                    rx_crc,
                    "comms_failure(retry_get_ack>limit)",
                    "comms_failure(retry_get_data>limit)",
                )?;
                return if assertion::evaluate(assertion, &fields) {
                    Ok((fields, raw))
                } else {
                    warn!("uc_failure: read-back did not match requested value");
                    Err(Error::AssertionFailure)
                };
            }
            Ok(0x15) => {
                warn!("comms_failure(nak_rx)");
                return Err(Error::NakReceived);
            }
            Ok(other) => return Err(Error::UnexpectedByte(other)),
            Err(Error::TransportTimeout) => {
                debug!("set ack lost, taking verify path");
                transport.write(&get_framed)?;
                let (fields, raw) = run_ack_and_data_phase(
                    transport,
                    &get_framed,
                    decoders,
                    rx_crc,
                    "comms_failure(retry_verify_get_ack>limit)",
                    "comms_failure(retry_verify_get_data>limit)",
                )?;
                if assertion::evaluate(assertion, &fields) {
                    return Ok((fields, raw));
                }
                verify_retries += 1;
                debug!("verify assert failed, retry {verify_retries}/{RETRY_LIMIT}");
                if verify_retries >= RETRY_LIMIT {
                    return Err(Error::Protocol("comms_failure(retry_verify_assert_data>limit)"));
                }
                transport.write(&set_framed)?;
            }
            Err(e) => return Err(e),
        }
    }
}
