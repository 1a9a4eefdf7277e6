/// A healthy inverter status page, as served from `/home.cgi`
pub const INVERTER_PAGE: &str =
    "\n\nREG1\nKEY1\nHW1\nSW1\n14:31 02/06/2024\nCloudOK\n\nSN123\n512\n9.3\nOK\n";

/// What the inverter serves while its firmware is still booting
pub const INVERTER_PAGE_EMPTY: &str = "\n\n\n\n\n\n\n\n\n\n\n\n\n";

/// State published for [`INVERTER_PAGE`] read in UTC
pub const SOLAR_STATE: &str = concat!(
    r#"{"last_updated":"2024-06-01T13:30:00.000Z","#,
    r#""power_ac":"512","energy_today":"9.30","status":"ON"}"#
);

pub const ROUTER_DIAGNOSE_INTERNET: &str = concat!(
    r#"while(1); /*{"WANAccessType":"Ethernet","ConnectionStatus":"Connected","#,
    r#""LinkStatus":"Up","ErrReason":"Success","Uptime":65,"X_IPv6Enable":false}*/"#
);

pub const ROUTER_DEVICE_INFO: &str = concat!(
    r#"while(1); /*{"DeviceName":"HG659","SerialNumber":"J3N8W17808904958","#,
    r#""ManufacturerOUI":"00E0FC","UpTime":1034698,"SoftwareVersion":"V100R001C216B112","#,
    r#""HardwareVersion":"VER.B"}*/"#
);
