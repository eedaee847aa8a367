use serde::{Deserialize, Serialize};

/*  PAYLOAD RULES
    =============

    1) quote: companyName, symbol, latestPrice, change are all required
        => no Option<> fields; a missing or null field fails the whole parse

    2) latestPrice/change may arrive as integers (e.g. 150)
        => f64 deserialisation accepts JSON integers as well

    3) the provider sends many more quote fields than we use
        => unknown fields are ignored
*/

// quote endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub company_name: String,
    pub symbol: String,
    #[serde(rename = "latestPrice")] // exposed as plain `price`
    pub price: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Quote {
    pub fn trend(&self) -> Trend {
        if self.change > 0.0 {
            Trend::Up
        } else if self.change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

// logo endpoint: only a pointer to the image itself
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Logo {
    pub url: String,
}
