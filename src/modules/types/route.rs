//! Route schemes, load-balance modes and idle-watcher identities

use crate::alias::construct;

/// Shape of a decoded route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    ReverseProxy,
    Stream,
    FileServer,
}

construct! {
    /// Route scheme, the discriminator of the route variant set
    pub enum Scheme in "scheme" {
        Http => "http",
        Https => "https",
        Tcp => "tcp",
        Udp => "udp",
        FileServer => "fileserver",
    }
}

impl Scheme {
    pub fn kind(&self) -> RouteKind {
        match self {
            Scheme::Http | Scheme::Https => RouteKind::ReverseProxy,
            Scheme::Tcp | Scheme::Udp => RouteKind::Stream,
            Scheme::FileServer => RouteKind::FileServer,
        }
    }

    /// Port a reverse proxy route targets when none is given
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Https => 443,
            _ => 80,
        }
    }
}

construct! {
    pub enum LoadBalanceMode in "load balance mode" {
        RoundRobin => "round_robin",
        LeastConn => "least_conn",
        IpHash => "ip_hash",
    }
}

construct! {
    /// How the idle watcher stops an idle container
    pub enum StopMethod in "stop method" {
        Pause => "pause",
        Stop => "stop",
        Kill => "kill",
    }
}

construct! {
    pub enum StopSignal in "stop signal" {
        Int => "SIGINT" | "INT",
        Term => "SIGTERM" | "TERM",
        Hup => "SIGHUP" | "HUP",
        Quit => "SIGQUIT" | "QUIT",
    }
}
