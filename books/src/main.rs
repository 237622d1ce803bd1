// Catalog
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Entry point to the catalog service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use catalog_books::db::init_schema;
use catalog_books::serve;
use catalog_core::db::postgres::{PostgresDb, PostgresOptions};
use catalog_core::db::{sqlite, Db};
use catalog_core::env::get_optional_var;
use catalog_core::rest::BaseUrl;
use std::error::Error;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Prefix of all environment variables that configure the service.
const ENV_PREFIX: &str = "CATALOG";

/// Port to listen on when none is configured.
const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let port = get_optional_var::<u16>(ENV_PREFIX, "PORT")?.unwrap_or(DEFAULT_PORT);
    let addr = (Ipv4Addr::UNSPECIFIED, port);
    let base_url = BaseUrl::from_env(ENV_PREFIX)?;
    let seed = get_optional_var::<bool>(ENV_PREFIX, "SEED")?.unwrap_or(false);

    let db: Arc<dyn Db + Send + Sync> =
        match get_optional_var::<String>(ENV_PREFIX, "SQLITE_URI")? {
            Some(uri) => Arc::new(sqlite::connect(&uri).await?),
            None => {
                let db_opts = PostgresOptions::from_env("PGSQL_PROD")?;
                Arc::new(PostgresDb::connect(db_opts)?)
            }
        };
    init_schema(&mut db.ex().await?).await?;

    let result = serve(addr, db.clone(), base_url, seed).await;
    db.close().await;
    result
}
