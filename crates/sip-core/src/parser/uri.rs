//! # SIP URI Parser
//!
//! A nom grammar for the reduced URI form used throughout this crate:
//!
//! ```text
//! scheme:[user@]host[:port][;param[=value]]*
//! ```
//!
//! Hostnames and IPv4 literals are accepted in the host position.  The
//! userinfo password form and URI headers (`?key=value`) are not part of
//! this grammar.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::{map_res, opt},
    multi::many0,
    sequence::{preceded, terminated},
    IResult,
};

use crate::types::uri::{Param, Scheme, Uri};

fn is_user_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-_.!~*'()&=+$,;?/%".contains(c)
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-'
}

fn scheme(input: &str) -> IResult<&str, Scheme> {
    map_res(
        terminated(
            take_while1(|c: char| c.is_ascii_alphanumeric() || "+-.".contains(c)),
            char(':'),
        ),
        |s: &str| s.parse::<Scheme>(),
    )(input)
}

/// The userinfo component only exists when terminated by `@`; on any other
/// input this fails without consuming, so the caller can backtrack.
fn userinfo(input: &str) -> IResult<&str, &str> {
    terminated(take_while1(is_user_char), char('@'))(input)
}

fn host(input: &str) -> IResult<&str, &str> {
    take_while1(is_host_char)(input)
}

fn port(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |s: &str| s.parse::<u16>())(input)
}

fn param(input: &str) -> IResult<&str, Param> {
    let (rest, name) = take_while1(|c: char| c != ';' && c != '=' && c != '?')(input)?;
    let (rest, value) = opt(preceded(
        char('='),
        take_while1(|c: char| c != ';' && c != '?'),
    ))(rest)?;
    Ok((rest, Param::from_key_value(name, value)))
}

/// Parse a URI, returning the unconsumed remainder.
pub fn parse_uri(input: &str) -> IResult<&str, Uri> {
    let (rest, scheme) = scheme(input)?;
    let (rest, user) = opt(userinfo)(rest)?;
    let (rest, host) = host(rest)?;
    let (rest, port) = opt(preceded(char(':'), port))(rest)?;
    let (rest, params) = many0(preceded(char(';'), param))(rest)?;

    Ok((
        rest,
        Uri {
            scheme,
            user: user.map(str::to_string),
            host: host.to_string(),
            port,
            params,
        },
    ))
}
