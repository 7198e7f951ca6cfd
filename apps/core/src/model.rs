#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerNode {
    pub hostname: String,
    pub ipv4: String,
    pub online: bool,
    normalized_hostname: String,
}

impl PeerNode {
    pub fn new(hostname: &str, ipv4: &str, online: bool) -> Self {
        Self::from_owned(hostname.to_string(), ipv4.to_string(), online)
    }

    pub fn from_owned(hostname: String, ipv4: String, online: bool) -> Self {
        let normalized_hostname = normalize_for_search(&hostname);
        Self {
            hostname,
            ipv4,
            online,
            normalized_hostname,
        }
    }

    pub fn normalized_hostname(&self) -> &str {
        &self.normalized_hostname
    }
}

pub fn normalize_for_search(input: &str) -> String {
    input.chars().flat_map(|c| c.to_lowercase()).collect()
}

/// Loose IPv4 heuristic: any address containing a `.` qualifies.
pub fn first_ipv4<'a, I>(addresses: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    addresses
        .into_iter()
        .map(String::as_str)
        .find(|address| address.contains('.'))
}
