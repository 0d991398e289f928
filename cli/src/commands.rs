use std::io::{self, Read};

use anyhow::Context;
use phonenumber::country;
use sipgate::{Connection, DialNumber, Endpoint, PhoneNumber, SessionId, Tos, ValidationError};

/// Turn user input into a dialable number, optionally through E.164 parsing.
pub fn dial_number(
    input: &str,
    region: Option<country::Id>,
) -> Result<DialNumber, ValidationError> {
    match region {
        Some(region) => Ok(PhoneNumber::parse(Some(region), input)?.into()),
        None => DialNumber::sanitize(input),
    }
}

pub async fn call(
    connection: &Connection,
    number: &DialNumber,
    endpoint: Option<&str>,
) -> anyhow::Result<()> {
    let endpoint = match endpoint {
        Some(name) => find_endpoint(connection.voice_endpoints(), name)
            .with_context(|| format!("no voice endpoint named '{name}'"))?,
        None => connection
            .default_endpoint()
            .ok_or(sipgate::SipgateError::NoDefaultEndpoint)?,
    };

    println!("Initiating voice call ...");
    let session = endpoint.voice_to(number).await?;
    println!("session {}", session.id());
    Ok(())
}

pub async fn sms(
    connection: &Connection,
    number: &DialNumber,
    message: Option<String>,
) -> anyhow::Result<()> {
    let message = match message {
        Some(message) => message,
        None => {
            let mut body = String::new();
            io::stdin()
                .read_to_string(&mut body)
                .context("reading message from stdin")?;
            body
        }
    };

    println!("Sending SMS ...");
    connection.text_to(number, &message).await?;
    Ok(())
}

pub async fn balance(connection: &Connection) -> anyhow::Result<()> {
    let balance = connection.balance().await?;
    println!(
        "Your account balance is {} {}",
        balance.amount, balance.currency
    );
    Ok(())
}

pub fn endpoints(connection: &Connection, tos: Option<&str>) -> anyhow::Result<()> {
    let endpoints = match tos {
        Some(tos) => connection.tos_endpoints(&Tos::from(tos)),
        None => connection.endpoints().iter().collect(),
    };

    for endpoint in endpoints {
        let tos = endpoint
            .tos()
            .iter()
            .map(Tos::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let marker = if endpoint.is_default() { '*' } else { ' ' };
        println!("{marker} {:<20} {:<32} {tos}", endpoint.name(), endpoint.uri());
    }
    Ok(())
}

pub async fn greeting(connection: &Connection) -> anyhow::Result<()> {
    let greeting = connection.greeting().await?;
    println!("{}", serde_json::to_string_pretty(&greeting)?);
    Ok(())
}

pub async fn status(connection: &Connection, session_id: &str) -> anyhow::Result<()> {
    let session = connection.session(SessionId::new(session_id)?);
    println!("{}", session.state().await?);
    Ok(())
}

pub async fn hangup(connection: &Connection, session_id: &str) -> anyhow::Result<()> {
    let session = connection.session(SessionId::new(session_id)?);
    session.close().await?;
    println!("session {} closed", session.id());
    Ok(())
}

/// Match by display name first, then by URI.
fn find_endpoint<'a>(endpoints: Vec<&'a Endpoint>, name: &str) -> Option<&'a Endpoint> {
    endpoints
        .iter()
        .find(|endpoint| endpoint.name() == name)
        .or_else(|| {
            endpoints
                .iter()
                .find(|endpoint| endpoint.uri().as_str() == name)
        })
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_number_sanitizes_without_region() {
        let number = dial_number("+49 (0)123-456 789", None).unwrap();
        assert_eq!(number.digits(), "490123456789");
    }

    #[test]
    fn dial_number_normalizes_with_region() {
        let number = dial_number("0211 1234567", Some(country::Id::DE)).unwrap();
        assert_eq!(number.digits(), "492111234567");
    }

    #[test]
    fn dial_number_reports_invalid_input() {
        assert!(dial_number("no digits", None).is_err());
        assert!(dial_number("", Some(country::Id::DE)).is_err());
    }
}
