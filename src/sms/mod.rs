//! Bit-exact codec for 3GPP TS 23.040 `application/vnd.3gpp.sms`
//! payloads: SMS-DELIVER, SMS-SUBMIT and SMS-STATUS-REPORT.
//!
//! Everything in this module is pure and synchronous; no function
//! suspends or touches I/O, so the codec is safe to call from any
//! thread or task.

pub mod address;
pub mod codec;
pub mod dcs;
pub mod error;
pub mod gsm7;
pub mod messages;
pub mod timestamp;
pub mod user_data;
pub mod validity;

pub use address::{Address, NumberingPlan, TypeOfNumber};
pub use codec::{decode_sms, decode_sms_hex, encode_sms, encode_sms_hex};
pub use dcs::{Alphabet, DataCodingScheme};
pub use error::CodecError;
pub use messages::{SmsDeliver, SmsMessage, SmsStatusReport, SmsSubmit, Tpdu, ValidityPeriod};
pub use user_data::{Payload, UserData};
