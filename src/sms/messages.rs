// ABOUTME: Domain model for the supported TPDUs: DELIVER, SUBMIT and STATUS-REPORT
// ABOUTME: A sealed enum discriminates the variants; the MTI is derived, never stored

use crate::sms::address::Address;
use crate::sms::dcs::DataCodingScheme;
use crate::sms::user_data::UserData;
use chrono::{DateTime, FixedOffset};
use std::time::Duration;

/// TP-Validity-Period of an SMS-SUBMIT.
///
/// The "enhanced" wire format (VPF 01) is not supported and cannot be
/// expressed here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidityPeriod {
    #[default]
    None,
    Relative(Duration),
    Absolute(DateTime<FixedOffset>),
}

/// SMS-DELIVER (SC -> MS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsDeliver {
    pub originating_address: Address,
    pub pid: u8,
    pub dcs: DataCodingScheme,
    pub service_centre_time_stamp: DateTime<FixedOffset>,
    pub user_data: UserData,
    pub status_report_indication: bool,
    pub more_messages: bool,
    pub reply_path: bool,
}

/// SMS-SUBMIT (MS -> SC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsSubmit {
    pub message_reference: u8,
    pub destination_address: Address,
    pub pid: u8,
    pub dcs: DataCodingScheme,
    pub user_data: UserData,
    pub status_report_request: bool,
    pub reject_duplicates: bool,
    pub reply_path: bool,
    pub validity_period: ValidityPeriod,
}

/// SMS-STATUS-REPORT (SC -> MS).
///
/// The optional tail (`pid`, `dcs`, `user_data`) is gated by the TP-PI
/// presence byte on the wire and omitted entirely when all three are
/// absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsStatusReport {
    pub message_reference: u8,
    pub recipient_address: Address,
    pub service_centre_time_stamp: DateTime<FixedOffset>,
    pub discharge_time: DateTime<FixedOffset>,
    pub status: u8,
    pub pid: Option<u8>,
    pub dcs: Option<DataCodingScheme>,
    pub user_data: Option<UserData>,
    pub more_messages: bool,
    pub status_report_qualifier: bool,
    pub reply_path: bool,
}

/// The supported TPDU variants, discriminated by MTI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tpdu {
    Deliver(SmsDeliver),
    Submit(SmsSubmit),
    StatusReport(SmsStatusReport),
}

/// A complete SMS payload: optional SMSC header plus one TPDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub smsc: Option<Address>,
    pub tpdu: Tpdu,
}

impl SmsMessage {
    pub fn new(smsc: Option<Address>, tpdu: Tpdu) -> Self {
        Self { smsc, tpdu }
    }

    /// Message Type Indicator: 0 DELIVER, 1 SUBMIT, 2 STATUS-REPORT.
    pub fn mti(&self) -> u8 {
        match self.tpdu {
            Tpdu::Deliver(_) => 0,
            Tpdu::Submit(_) => 1,
            Tpdu::StatusReport(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sms::user_data::UserData;

    #[test]
    fn mti_follows_variant() {
        let deliver = SmsMessage::new(
            None,
            Tpdu::Deliver(SmsDeliver {
                originating_address: Address::from_string("+123"),
                pid: 0,
                dcs: DataCodingScheme::default(),
                service_centre_time_stamp: DateTime::parse_from_rfc3339(
                    "2024-01-01T00:00:00+00:00",
                )
                .unwrap(),
                user_data: UserData::text("x"),
                status_report_indication: false,
                more_messages: false,
                reply_path: false,
            }),
        );
        assert_eq!(deliver.mti(), 0);

        let submit = SmsMessage::new(
            None,
            Tpdu::Submit(SmsSubmit {
                message_reference: 0,
                destination_address: Address::from_string("+123"),
                pid: 0,
                dcs: DataCodingScheme::default(),
                user_data: UserData::text("x"),
                status_report_request: false,
                reject_duplicates: false,
                reply_path: false,
                validity_period: ValidityPeriod::None,
            }),
        );
        assert_eq!(submit.mti(), 1);
    }
}
