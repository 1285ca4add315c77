// ABOUTME: Top-level TPDU marshalling: SMSC peel, first-octet dispatch by MTI
// ABOUTME: Demands that decoding consumes the payload exactly; trailing bytes fail

use crate::sms::address::{decode_address, decode_smsc, encode_address, encode_smsc};
use crate::sms::dcs::DataCodingScheme;
use crate::sms::error::CodecError;
use crate::sms::messages::{
    SmsDeliver, SmsMessage, SmsStatusReport, SmsSubmit, Tpdu, ValidityPeriod,
};
use crate::sms::timestamp::{decode_timestamp, encode_timestamp};
use crate::sms::user_data::{decode_user_data, encode_user_data, extract_user_data_bytes};
use crate::sms::validity::{decode_relative_validity, encode_relative_validity};
use chrono::{DateTime, FixedOffset};

const FIRST_OCTET_REPLY_PATH: u8 = 0x80;
const FIRST_OCTET_UDHI: u8 = 0x40;
const FIRST_OCTET_STATUS_REPORT: u8 = 0x20;
const FIRST_OCTET_MMS: u8 = 0x04; // set means "no more messages"
const FIRST_OCTET_REJECT_DUPLICATES: u8 = 0x04;

const TP_PI_PID: u8 = 0x01;
const TP_PI_DCS: u8 = 0x02;
const TP_PI_UD: u8 = 0x04;

fn read_u8(data: &[u8], offset: usize, field: &'static str) -> Result<u8, CodecError> {
    data.get(offset).copied().ok_or(CodecError::Truncated(field))
}

fn read_timestamp(
    data: &[u8],
    offset: usize,
) -> Result<(DateTime<FixedOffset>, usize), CodecError> {
    let slice = data
        .get(offset..offset + 7)
        .ok_or(CodecError::Truncated("timestamp"))?;
    Ok((decode_timestamp(slice)?, offset + 7))
}

/// Decodes a raw `application/vnd.3gpp.sms` payload.
///
/// Peels the SMSC header, dispatches on the MTI bits of the first
/// octet, and fails with [`CodecError::TrailingBytes`] unless the TPDU
/// consumes the input exactly.
pub fn decode_sms(data: &[u8]) -> Result<SmsMessage, CodecError> {
    if data.is_empty() {
        return Err(CodecError::EmptyPayload);
    }
    let (smsc, offset) = decode_smsc(data, 0)?;
    let first_octet = read_u8(data, offset, "TPDU first octet")?;
    let (tpdu, offset) = match first_octet & 0x03 {
        0 => {
            let (deliver, offset) = decode_deliver(data, offset)?;
            (Tpdu::Deliver(deliver), offset)
        }
        1 => {
            let (submit, offset) = decode_submit(data, offset)?;
            (Tpdu::Submit(submit), offset)
        }
        2 => {
            let (report, offset) = decode_status_report(data, offset)?;
            (Tpdu::StatusReport(report), offset)
        }
        mti => return Err(CodecError::UnsupportedMti(mti)),
    };
    if offset != data.len() {
        return Err(CodecError::TrailingBytes);
    }
    Ok(SmsMessage::new(smsc, tpdu))
}

/// Decodes a hex-encoded payload; upper- and lower-case are accepted.
pub fn decode_sms_hex(data: &str) -> Result<SmsMessage, CodecError> {
    let raw = hex::decode(data.trim())?;
    decode_sms(&raw)
}

/// Encodes a message to raw bytes, the strict inverse of
/// [`decode_sms`].
pub fn encode_sms(message: &SmsMessage) -> Result<Vec<u8>, CodecError> {
    let mut out = encode_smsc(message.smsc.as_ref())?;
    match &message.tpdu {
        Tpdu::Deliver(deliver) => out.extend(encode_deliver(deliver)?),
        Tpdu::Submit(submit) => out.extend(encode_submit(submit)?),
        Tpdu::StatusReport(report) => out.extend(encode_status_report(report)?),
    }
    Ok(out)
}

/// Encodes a message to lower-case hex.
pub fn encode_sms_hex(message: &SmsMessage) -> Result<String, CodecError> {
    Ok(hex::encode(encode_sms(message)?))
}

fn decode_deliver(data: &[u8], offset: usize) -> Result<(SmsDeliver, usize), CodecError> {
    let first_octet = data[offset];
    let mut offset = offset + 1;
    let reply_path = first_octet & FIRST_OCTET_REPLY_PATH != 0;
    let udhi = first_octet & FIRST_OCTET_UDHI != 0;
    let status_report_indication = first_octet & FIRST_OCTET_STATUS_REPORT != 0;
    let more_messages = first_octet & FIRST_OCTET_MMS == 0;

    let (originating_address, next) = decode_address(data, offset)?;
    offset = next;
    let pid = read_u8(data, offset, "TP-PID")?;
    let dcs = DataCodingScheme::from_raw(read_u8(data, offset + 1, "TP-DCS")?);
    offset += 2;
    let (service_centre_time_stamp, next) = read_timestamp(data, offset)?;
    offset = next;
    let udl = read_u8(data, offset, "TP-UDL")?;
    offset += 1;
    let (ud_bytes, offset) = extract_user_data_bytes(data, offset, udl, dcs.alphabet(), udhi)?;
    let user_data = decode_user_data(&ud_bytes, udl, &dcs, udhi)?;

    Ok((
        SmsDeliver {
            originating_address,
            pid,
            dcs,
            service_centre_time_stamp,
            user_data,
            status_report_indication,
            more_messages,
            reply_path,
        },
        offset,
    ))
}

fn encode_deliver(deliver: &SmsDeliver) -> Result<Vec<u8>, CodecError> {
    let mut first_octet = 0u8;
    if deliver.reply_path {
        first_octet |= FIRST_OCTET_REPLY_PATH;
    }
    if deliver.user_data.effective_header().is_some() {
        first_octet |= FIRST_OCTET_UDHI;
    }
    if deliver.status_report_indication {
        first_octet |= FIRST_OCTET_STATUS_REPORT;
    }
    if !deliver.more_messages {
        first_octet |= FIRST_OCTET_MMS;
    }
    let mut out = vec![first_octet];
    out.extend(encode_address(&deliver.originating_address)?);
    out.push(deliver.pid);
    out.push(deliver.dcs.raw());
    out.extend_from_slice(&encode_timestamp(&deliver.service_centre_time_stamp)?);
    let (udl, ud_bytes) = encode_user_data(&deliver.user_data, &deliver.dcs)?;
    out.push(udl);
    out.extend(ud_bytes);
    Ok(out)
}

fn decode_submit(data: &[u8], offset: usize) -> Result<(SmsSubmit, usize), CodecError> {
    let first_octet = data[offset];
    let mut offset = offset + 1;
    let reply_path = first_octet & FIRST_OCTET_REPLY_PATH != 0;
    let udhi = first_octet & FIRST_OCTET_UDHI != 0;
    let status_report_request = first_octet & FIRST_OCTET_STATUS_REPORT != 0;
    let vpf = (first_octet >> 3) & 0x03;
    let reject_duplicates = first_octet & FIRST_OCTET_REJECT_DUPLICATES != 0;

    let message_reference = read_u8(data, offset, "TP-MR")?;
    offset += 1;
    let (destination_address, next) = decode_address(data, offset)?;
    offset = next;
    let pid = read_u8(data, offset, "TP-PID")?;
    let dcs = DataCodingScheme::from_raw(read_u8(data, offset + 1, "TP-DCS")?);
    offset += 2;

    let validity_period = match vpf {
        0 => ValidityPeriod::None,
        2 => {
            let value = read_u8(data, offset, "TP-VP")?;
            offset += 1;
            ValidityPeriod::Relative(decode_relative_validity(value))
        }
        3 => {
            let (expiry, next) = read_timestamp(data, offset)?;
            offset = next;
            ValidityPeriod::Absolute(expiry)
        }
        _ => return Err(CodecError::UnsupportedValidityFormat),
    };

    let udl = read_u8(data, offset, "TP-UDL")?;
    offset += 1;
    let (ud_bytes, offset) = extract_user_data_bytes(data, offset, udl, dcs.alphabet(), udhi)?;
    let user_data = decode_user_data(&ud_bytes, udl, &dcs, udhi)?;

    Ok((
        SmsSubmit {
            message_reference,
            destination_address,
            pid,
            dcs,
            user_data,
            status_report_request,
            reject_duplicates,
            reply_path,
            validity_period,
        },
        offset,
    ))
}

fn encode_submit(submit: &SmsSubmit) -> Result<Vec<u8>, CodecError> {
    let mut first_octet = 0x01u8;
    if submit.reply_path {
        first_octet |= FIRST_OCTET_REPLY_PATH;
    }
    if submit.user_data.effective_header().is_some() {
        first_octet |= FIRST_OCTET_UDHI;
    }
    if submit.status_report_request {
        first_octet |= FIRST_OCTET_STATUS_REPORT;
    }
    if submit.reject_duplicates {
        first_octet |= FIRST_OCTET_REJECT_DUPLICATES;
    }
    let (vpf_bits, vp_field) = match &submit.validity_period {
        ValidityPeriod::None => (0x00, Vec::new()),
        ValidityPeriod::Relative(duration) => {
            (0x10, vec![encode_relative_validity(*duration)])
        }
        ValidityPeriod::Absolute(expiry) => (0x18, encode_timestamp(expiry)?.to_vec()),
    };
    first_octet |= vpf_bits;

    let mut out = vec![first_octet, submit.message_reference];
    out.extend(encode_address(&submit.destination_address)?);
    out.push(submit.pid);
    out.push(submit.dcs.raw());
    out.extend(vp_field);
    let (udl, ud_bytes) = encode_user_data(&submit.user_data, &submit.dcs)?;
    out.push(udl);
    out.extend(ud_bytes);
    Ok(out)
}

fn decode_status_report(
    data: &[u8],
    offset: usize,
) -> Result<(SmsStatusReport, usize), CodecError> {
    let first_octet = data[offset];
    let mut offset = offset + 1;
    let reply_path = first_octet & FIRST_OCTET_REPLY_PATH != 0;
    let udhi = first_octet & FIRST_OCTET_UDHI != 0;
    let status_report_qualifier = first_octet & FIRST_OCTET_STATUS_REPORT != 0;
    let more_messages = first_octet & FIRST_OCTET_MMS == 0;

    let message_reference = read_u8(data, offset, "TP-MR")?;
    offset += 1;
    let (recipient_address, next) = decode_address(data, offset)?;
    offset = next;
    let (service_centre_time_stamp, next) = read_timestamp(data, offset)?;
    offset = next;
    let (discharge_time, next) = read_timestamp(data, offset)?;
    offset = next;
    let status = read_u8(data, offset, "TP-ST")?;
    offset += 1;

    let mut pid = None;
    let mut dcs: Option<DataCodingScheme> = None;
    let mut user_data = None;
    if offset < data.len() {
        let tp_pi = data[offset];
        offset += 1;
        if tp_pi & TP_PI_PID != 0 {
            pid = Some(read_u8(data, offset, "TP-PID")?);
            offset += 1;
        }
        if tp_pi & TP_PI_DCS != 0 {
            dcs = Some(DataCodingScheme::from_raw(read_u8(data, offset, "TP-DCS")?));
            offset += 1;
        }
        if tp_pi & TP_PI_UD != 0 {
            let Some(dcs) = dcs.as_ref() else {
                return Err(CodecError::MissingDcs);
            };
            let udl = read_u8(data, offset, "TP-UDL")?;
            offset += 1;
            let (ud_bytes, next) =
                extract_user_data_bytes(data, offset, udl, dcs.alphabet(), udhi)?;
            offset = next;
            user_data = Some(decode_user_data(&ud_bytes, udl, dcs, udhi)?);
        }
    }

    Ok((
        SmsStatusReport {
            message_reference,
            recipient_address,
            service_centre_time_stamp,
            discharge_time,
            status,
            pid,
            dcs,
            user_data,
            more_messages,
            status_report_qualifier,
            reply_path,
        },
        offset,
    ))
}

fn encode_status_report(report: &SmsStatusReport) -> Result<Vec<u8>, CodecError> {
    let mut first_octet = 0x02u8;
    if report.reply_path {
        first_octet |= FIRST_OCTET_REPLY_PATH;
    }
    if report
        .user_data
        .as_ref()
        .and_then(|ud| ud.effective_header())
        .is_some()
    {
        first_octet |= FIRST_OCTET_UDHI;
    }
    if report.status_report_qualifier {
        first_octet |= FIRST_OCTET_STATUS_REPORT;
    }
    if !report.more_messages {
        first_octet |= FIRST_OCTET_MMS;
    }

    let mut out = vec![first_octet, report.message_reference];
    out.extend(encode_address(&report.recipient_address)?);
    out.extend_from_slice(&encode_timestamp(&report.service_centre_time_stamp)?);
    out.extend_from_slice(&encode_timestamp(&report.discharge_time)?);
    out.push(report.status);

    let mut tp_pi = 0u8;
    let mut tail = Vec::new();
    if let Some(pid) = report.pid {
        tp_pi |= TP_PI_PID;
        tail.push(pid);
    }
    if let Some(dcs) = &report.dcs {
        tp_pi |= TP_PI_DCS;
        tail.push(dcs.raw());
    }
    if let Some(user_data) = &report.user_data {
        let Some(dcs) = &report.dcs else {
            return Err(CodecError::MissingDcs);
        };
        tp_pi |= TP_PI_UD;
        let (udl, ud_bytes) = encode_user_data(user_data, dcs)?;
        tail.push(udl);
        tail.extend(ud_bytes);
    }
    // The whole tail is omitted when nothing is present; re-encoding a
    // report decoded without a tail must not introduce a zero TP-PI.
    if tp_pi != 0 {
        out.push(tp_pi);
        out.extend(tail);
    }
    Ok(out)
}
