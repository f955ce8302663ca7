//! Region and service resolution from AWS host names.

use sigv4_core::Error;
use sigv4_core::Result;

const AMAZONAWS_SUFFIX: &str = ".amazonaws.com";
const DEFAULT_REGION: &str = "us-east-1";

/// Parse the service name from an AWS endpoint host.
///
/// ```
/// use sigv4_aws::parse_service_name;
///
/// assert_eq!(parse_service_name("iam.amazonaws.com").unwrap(), "iam");
/// assert_eq!(parse_service_name("bucket.s3.us-west-2.amazonaws.com").unwrap(), "s3");
/// ```
pub fn parse_service_name(host: &str) -> Result<String> {
    let Some(prefix) = host.strip_suffix(AMAZONAWS_SUFFIX) else {
        return Err(Error::config_invalid(format!(
            "can't parse service name from non-AWS host {host}, set the service explicitly"
        )));
    };

    if prefix == "s3" || prefix.ends_with(".s3") || match_service_region(prefix, "s3", true).is_some()
    {
        return Ok("s3".to_string());
    }

    let service = match prefix.split_once('.') {
        Some((service, _)) => service,
        None => prefix,
    };
    Ok(service.to_string())
}

/// Parse the region name from an endpoint host.
///
/// `service_hint` helps with hosts outside of `amazonaws.com`, for example
/// `bucket.s3-eu-west-1.example.com`. `us-east-1` is returned when nothing matches.
pub fn parse_region_name(host: &str, service_hint: Option<&str>) -> String {
    if let Some(fragment) = host.strip_suffix(AMAZONAWS_SUFFIX) {
        return parse_standard_region_name(fragment);
    }

    if let Some(region) = service_hint.and_then(|service| match_service_region(host, service, false))
    {
        return region.to_string();
    }

    DEFAULT_REGION.to_string()
}

fn parse_standard_region_name(fragment: &str) -> String {
    if let Some(region) = match_service_region(fragment, "s3", true) {
        return region.to_string();
    }

    if let Some(region) = fragment
        .strip_suffix(".cloudsearch")
        .and_then(|v| match v.rsplit_once('.') {
            Some(("", _)) => None,
            Some((_, region)) => Some(region),
            None => Some(v),
        })
        .filter(|v| is_region_like(v))
    {
        return region.to_string();
    }

    match fragment.rsplit_once('.') {
        // `bucket.s3.amazonaws.com` is the global S3 endpoint.
        None | Some((_, "s3")) => DEFAULT_REGION.to_string(),
        Some((_, "us-gov")) => "us-gov-west-1".to_string(),
        Some((_, region)) => region.to_string(),
    }
}

fn is_region_like(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Find `<service>[.-]<region>` in `s` where `<service>` starts `s` or follows a
/// dot. The last occurrence wins.
///
/// With `at_end` the region must end `s`, otherwise it must be followed by a dot.
fn match_service_region<'a>(s: &'a str, service: &str, at_end: bool) -> Option<&'a str> {
    if service.is_empty() {
        return None;
    }

    let bs = s.as_bytes();
    (0..bs.len()).rev().find_map(|i| {
        if i != 0 && (i < 2 || bs[i - 1] != b'.') {
            return None;
        }
        if !bs[i..].starts_with(service.as_bytes()) {
            return None;
        }

        let rest = &s[i + service.len()..];
        let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix('-'))?;
        let end = rest
            .bytes()
            .position(|b| !(b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'))
            .unwrap_or(rest.len());
        let (region, tail) = rest.split_at(end);

        let tail_ok = if at_end {
            tail.is_empty()
        } else {
            tail.starts_with('.')
        };
        (!region.is_empty() && tail_ok).then_some(region)
    })
}
