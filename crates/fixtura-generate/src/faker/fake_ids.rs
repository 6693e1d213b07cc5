use chrono::{Duration, NaiveDate, NaiveDateTime};
use fake::Fake;
use fake::faker::address::en::{
    BuildingNumber, CityName, CountryName, StateName, StreetName, ZipCode,
};
use fake::faker::company::en::{CatchPhrase, CompanyName};
use fake::faker::internet::en::{
    DomainSuffix, FreeEmail, IPv4, IPv6, Password, SafeEmail, Username,
};
use fake::faker::lorem::en::{Paragraph, Sentence, Word, Words};
use fake::faker::name::en::{FirstName, LastName, Name, Title};
use fake::faker::phone_number::en::PhoneNumber;
use rand::{Rng, RngCore};
use serde_json::Value;

const TIMESTAMP_SPAN_SECS: i64 = 365 * 24 * 60 * 60;

/// Resolve a faker.js-style id (`name.findName`, `internet.email`, ...).
pub(super) fn fake_by_id(id: &str, rng: &mut dyn RngCore) -> Option<Value> {
    let normalized = id.trim().to_ascii_lowercase();
    let normalized = normalized.strip_prefix("faker.").unwrap_or(&normalized);

    let text: String = match normalized {
        "name.findname" | "name.fullname" | "person.fullname" => Name().fake_with_rng(rng),
        "name.firstname" | "person.firstname" => FirstName().fake_with_rng(rng),
        "name.lastname" | "person.lastname" => LastName().fake_with_rng(rng),
        "name.title" | "name.prefix" | "person.prefix" => Title().fake_with_rng(rng),
        "internet.email" | "internet.exampleemail" => SafeEmail().fake_with_rng(rng),
        "internet.freeemail" => FreeEmail().fake_with_rng(rng),
        "internet.username" | "internet.displayname" => Username().fake_with_rng(rng),
        "internet.password" => Password(8..16).fake_with_rng(rng),
        "internet.ip" | "internet.ipv4" => IPv4().fake_with_rng(rng),
        "internet.ipv6" => IPv6().fake_with_rng(rng),
        "internet.url" => url(rng),
        "internet.domainname" => hostname(rng),
        "lorem.word" => Word().fake_with_rng(rng),
        "lorem.words" => {
            let words: Vec<String> = Words(3..6).fake_with_rng(rng);
            words.join(" ")
        }
        "lorem.sentence" => Sentence(4..10).fake_with_rng(rng),
        "lorem.paragraph" => Paragraph(2..4).fake_with_rng(rng),
        "address.city" | "location.city" => CityName().fake_with_rng(rng),
        "address.streetname" | "location.street" => StreetName().fake_with_rng(rng),
        "address.streetaddress" | "location.streetaddress" => {
            let number: String = BuildingNumber().fake_with_rng(rng);
            let street: String = StreetName().fake_with_rng(rng);
            format!("{number} {street}")
        }
        "address.zipcode" | "location.zipcode" => ZipCode().fake_with_rng(rng),
        "address.country" | "location.country" => CountryName().fake_with_rng(rng),
        "address.state" | "location.state" => StateName().fake_with_rng(rng),
        "company.companyname" | "company.name" => CompanyName().fake_with_rng(rng),
        "company.catchphrase" => CatchPhrase().fake_with_rng(rng),
        "phone.phonenumber" | "phone.number" => PhoneNumber().fake_with_rng(rng),
        "random.uuid" | "datatype.uuid" | "string.uuid" => random_uuid(rng),
        "date.past" | "date.recent" | "date.future" | "date.anytime" => {
            random_timestamp(rng).format("%Y-%m-%dT%H:%M:%SZ").to_string()
        }
        "random.boolean" | "datatype.boolean" => return Some(Value::Bool(rng.random_bool(0.5))),
        "random.number" | "datatype.number" | "number.int" => {
            return Some(Value::from(rng.random_range(0..=99_999_i64)));
        }
        _ => return None,
    };

    Some(Value::String(text))
}

/// Values for the JSON Schema `format` keyword; `None` for unknown formats.
pub(super) fn fake_format(format: &str, rng: &mut dyn RngCore) -> Option<String> {
    let value = match format {
        "email" | "idn-email" => SafeEmail().fake_with_rng(rng),
        "uuid" => random_uuid(rng),
        "date-time" => random_timestamp(rng).format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "date" => random_timestamp(rng).format("%Y-%m-%d").to_string(),
        "time" => random_timestamp(rng).format("%H:%M:%S").to_string(),
        "uri" | "url" | "uri-reference" => url(rng),
        "hostname" | "idn-hostname" => hostname(rng),
        "ipv4" => IPv4().fake_with_rng(rng),
        "ipv6" => IPv6().fake_with_rng(rng),
        _ => return None,
    };
    Some(value)
}

/// Lorem words cut to a length between `min_len` and `max_len` characters.
pub(super) fn lorem_text(min_len: usize, max_len: usize, rng: &mut dyn RngCore) -> String {
    if max_len == 0 {
        return String::new();
    }

    let target = rng.random_range(min_len.max(1)..=max_len);
    let mut text = String::new();
    while text.chars().count() < target {
        if !text.is_empty() {
            text.push(' ');
        }
        let word: String = Word().fake_with_rng(rng);
        text.push_str(if word.is_empty() { "lorem" } else { &word });
    }

    let mut text: String = text.chars().take(target).collect();
    if text.ends_with(' ') {
        text.pop();
        text.push('a');
    }
    text
}

fn random_uuid(rng: &mut dyn RngCore) -> String {
    let bytes: [u8; 16] = rng.random();
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

fn random_timestamp(rng: &mut dyn RngCore) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    base + Duration::seconds(rng.random_range(0..TIMESTAMP_SPAN_SECS))
}

fn hostname(rng: &mut dyn RngCore) -> String {
    let word: String = Word().fake_with_rng(rng);
    let suffix: String = DomainSuffix().fake_with_rng(rng);
    format!("{}.{suffix}", word.to_ascii_lowercase())
}

fn url(rng: &mut dyn RngCore) -> String {
    format!("https://{}", hostname(rng))
}
