// ABOUTME: Demo: build an SMS-SUBMIT, print its wire hex, and decode it back
// ABOUTME: Run with `cargo run --example encode_sms -- --to +15555555555 --text hello`

use argh::FromArgs;
use sipsms::sms::{
    decode_sms_hex, encode_sms_hex, Address, DataCodingScheme, SmsMessage, SmsSubmit, Tpdu,
    UserData, ValidityPeriod,
};

/// Encode an SMS-SUBMIT TPDU to hex and decode it back.
#[derive(FromArgs)]
struct Args {
    /// destination number in international format
    #[argh(option, default = "String::from(\"+15555555555\")")]
    to: String,

    /// message text (GSM 7-bit alphabet)
    #[argh(option, default = "String::from(\"hellohello\")")]
    text: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = argh::from_env();

    let message = SmsMessage::new(
        None,
        Tpdu::Submit(SmsSubmit {
            message_reference: 0,
            destination_address: Address::from_string(&args.to),
            pid: 0,
            dcs: DataCodingScheme::from_raw(0x00),
            user_data: UserData::text(args.text),
            status_report_request: false,
            reject_duplicates: false,
            reply_path: false,
            validity_period: ValidityPeriod::None,
        }),
    );

    let hex = encode_sms_hex(&message)?;
    println!("{hex}");

    let decoded = decode_sms_hex(&hex)?;
    println!("{decoded:#?}");
    Ok(())
}
