#![warn(missing_docs)]
/*! A host-side client for a microcontroller-based I/O board: solid-state
relays, opto-isolated outputs, push buttons, analog and
temperature-probe inputs, a real-time clock with alarms and timers.

Communication happens over either a point-to-point serial link or a
UDP datagram channel to a fixed peer. The device accepts short,
bracketed ASCII command frames and replies with fixed-width binary
payloads, each preceded by a single ACK/NAK byte.

# Architecture overview

```text
        [ Operation ]
              |
        builds command bytes
              v
        [ Frame Codec ]
              |
        drives one of
              v
   [ Get FSM ]     [ Set FSM ]
        |               |
        +------ both ---+
              |
        talk to
              v
        [ Transport ]
      (Serial or Datagram)
```

The [`fsm`] module implements the two transaction state machines: a
[`fsm::run_get_fsm`] that reads a typed field sequence, and a
[`fsm::run_set_fsm`] that writes a value and then re-reads it to
confirm the device accepted it, retrying through a verify path if the
original acknowledgment byte was lost. [`operations::Session`] wraps a
[`transport::Transport`] and exposes one method per device operation.

# Example

```
use ioboard::operations::Session;
use ioboard::transport::LoopbackTransport;
use ioboard::command::IoType;

let t = LoopbackTransport::with_bytes(&[0x06, 0x01]);
let mut session = Session::new(t, false, false);
assert!(session.get_io_state(IoType::Ssr, 3).unwrap());
```
 */

pub mod assertion;
pub mod command;
pub mod config;
pub mod crc8;
pub mod decode;
pub mod error;
pub mod frame;
pub mod fsm;
pub mod operations;
pub mod transport;

pub use error::{Error, Result};
