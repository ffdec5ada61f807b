pub mod coindesk;
pub mod exchangerate_host;
pub mod http;
pub mod mail_api;
