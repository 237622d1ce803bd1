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

//! Loading of the demonstration dataset.

use crate::db;
use crate::driver::Driver;
use crate::model::{parse_date, Book, EntityId, Isbn, Publisher, PublisherCode, Version};
use catalog_core::db::repository::{self, UnitOfWork};
use catalog_core::driver::{DriverError, DriverResult};
use log::info;
use std::collections::HashMap;

/// Publishers of the demonstration dataset as `(code, name)` pairs.
const PUBLISHERS: &[(&str, &str)] = &[
    ("18468", "Alma Books"),
    ("82040", "Damm"),
    ("11181", "Turner Publishing Company"),
    ("07524", "The History Press"),
    ("82530", "Pax"),
    ("82054", "Gyldendal"),
    ("17847", "Vintage Books"),
    ("00995", "Vintage Books UK"),
    ("82021", "Cappelen"),
    ("82022", "Cappelen Damm"),
    ("14472", "Picador"),
    ("02978", "Weidenfeld & Nicolson (Orion Publishing Co)"),
    ("08575", "Doubleday (Transworld Publishers Ltd)"),
    ("02419", "Penguin Books Ltd"),
];

/// A book of the demonstration dataset.
struct SeedBook {
    /// ISBN of the book.
    isbn: &'static str,

    /// Title of the book.
    title: &'static str,

    /// Author of the book.
    author: &'static str,

    /// Code of the publisher, which must be one of `PUBLISHERS`.
    publisher: &'static str,

    /// Publication date in `YYYY-MM-DD` form.
    published: &'static str,

    /// Translator of the book, if any.
    translator: Option<&'static str>,

    /// Summary of the book.
    summary: &'static str,
}

/// Books of the demonstration dataset.
const BOOKS: &[SeedBook] = &[
    SeedBook {
        isbn: "9781846883668",
        title: "Travelling to Infinity: The True Story",
        author: "Hawking, Jane",
        publisher: "18468",
        published: "2015-01-18",
        translator: None,
        summary: "Soon to be a major motion picture starring Eddie Redmayne as Hawking and \
            Felicity Jones as his wife Jane. It chronicles their relationship, from his early \
            development of ALS to his success in physics.",
    },
    SeedBook {
        isbn: "9788204094261",
        title: "Superstjernen Stephen Hawking: biografi",
        author: "Gribbin, John; White, Michael",
        publisher: "82040",
        published: "2014-02-01",
        translator: Some("Larsen, Anne Kirsti Solheim; Larsen, Finn B."),
        summary: "Boka forteller om livet til vitenskapsmannen Stephen Hawking. Har register.",
    },
    SeedBook {
        isbn: "9781118175392",
        title: "Alone in the Universe: Why Our Planet Is Unique",
        author: "Gribbin, John",
        publisher: "11181",
        published: "2011-02-01",
        translator: None,
        summary: "The acclaimed author of In Search of Schrodinger's Cat searches for life on \
            other planets. Are we alone in the universe?",
    },
    SeedBook {
        isbn: "9780752495620",
        title: "Guide to Middle Earth: Tolkien and The Lord of the Rings",
        author: "Duriez, Colin",
        publisher: "07524",
        published: "2013-02-01",
        translator: None,
        summary: "An illuminating guide to Middle-earth and the man who created it.",
    },
    SeedBook {
        isbn: "9788253019727",
        title: "Vredens duer",
        author: "Steinbeck, John",
        publisher: "82530",
        published: "1998-02-01",
        translator: Some("Omre, Arthur"),
        summary: "Romanen står i dag som et minnesmerke over depresjonens elendighet. Handlingen \
            er hentet fra 1930-årenes USA.",
    },
    SeedBook {
        isbn: "9788205478428",
        title: "Gravrøys",
        author: "Theorin, Johan",
        publisher: "82054",
        published: "2014-02-01",
        translator: Some("Bolstad, Kari"),
        summary: "I Johan Theorins fjerde bok fra Öland forenes fortid og nåtid i en særdeles \
            velskrevet og ubehagelig krim.",
    },
    SeedBook {
        isbn: "9788205478336",
        title: "Kuppet: på innsiden av Norges mektigste mafiafamilie",
        author: "Aass, Hans Petter; Widerøe, Rolf J.",
        publisher: "82054",
        published: "2015-02-01",
        translator: None,
        summary: "En ny, knallsterk dokumentar fra forfatterne av bestselgerne Dødsranet og \
            Krigshelten. Tema: Nordea-kuppet, norgeshistoriens frekkeste bedrageri.",
    },
    SeedBook {
        isbn: "9788205418820",
        title: "Gyldendals store fugleguide: Europas og middelhavsområdets fugler i felt",
        author: "Svensson, Lars",
        publisher: "82054",
        published: "2011-02-01",
        translator: Some("Sandvik, Jostein; Syvertsen, Per Ole"),
        summary: "Verdens beste fuglebok i ny feltutgave!",
    },
    SeedBook {
        isbn: "9781784700089",
        title: "Alan Turing: The Enigma",
        author: "Hodges, Andrew",
        publisher: "00995",
        published: "2014-12-13",
        translator: None,
        summary: "This is the official book that inspired the film The Imitation Game. Alan Turing \
            was the mathematician whose cipher-cracking transformed the Second World War.",
    },
    SeedBook {
        isbn: "9780099554486",
        title: "The Lives of Others",
        author: "Mukherjee, Neel",
        publisher: "17847",
        published: "2015-02-08",
        translator: None,
        summary: "This is book shortlisted for the Man Booker Prize 2014. Calcutta, 1967.",
    },
    SeedBook {
        isbn: "9788202148683",
        title: "Fisken",
        author: "Loe, Erlend",
        publisher: "82021",
        published: "1994-02-01",
        translator: None,
        summary: "Kurt er truckfører. Hver dag kjører han truck nede på kaia, og han løfter kasser \
            som veier over 1000 kilo.",
    },
    SeedBook {
        isbn: "9788202244699",
        title: "Rumpemelk fra Afrika",
        author: "Loe, Erlend",
        publisher: "82022",
        published: "2012-10-01",
        translator: None,
        summary: "Marko kjeder seg og er tørst. Men han vil ikke ha vanlig melk. Han vil ha \
            rumpemelk fra Afrika.",
    },
    SeedBook {
        isbn: "9788202425975",
        title: "Doppler",
        author: "Loe, Erlend",
        publisher: "82022",
        published: "2013-11-01",
        translator: None,
        summary: "En samfunnskritisk roman om forbruk, eksistens ... og en elgkalv ved navn Bongo.",
    },
    SeedBook {
        isbn: "9788202426378",
        title: "Naiv. Super",
        author: "Loe, Erlend",
        publisher: "82022",
        published: "2013-02-01",
        translator: None,
        summary: "NAIV. SUPER. er en enkel historie om veldig kompliserte ting.",
    },
    SeedBook {
        isbn: "9788202365387",
        title: "Fonk",
        author: "Loe, Erlend",
        publisher: "82022",
        published: "2011-11-01",
        translator: None,
        summary: "Fvonk har jobbet i Norges gang- og mosjonsforbund i forbundets vanskelige \
            periode. Tilfeldigvis heter han Jens, og tilfeldigvis er han statsminister.",
    },
    SeedBook {
        isbn: "9781447268970",
        title: "Station Eleven",
        author: "St. John Mandel, Emily",
        publisher: "14472",
        published: "2015-02-01",
        translator: None,
        summary: "DAY ONE The Georgia Flu explodes over the surface of the earth like a neutron \
            bomb. News reports put the mortality rate at over 99%.",
    },
    SeedBook {
        isbn: "9781447279402",
        title: "The Guest Cat",
        author: "Hiraide, Takashi",
        publisher: "14472",
        published: "2014-10-25",
        translator: Some("Selland, Eric"),
        summary: "A couple in their thirties live in a small rented cottage in a quiet part of \
            Tokyo. One day a cat invites itself into their small kitchen.",
    },
    SeedBook {
        isbn: "9780241971987",
        title: "Little Failure",
        author: "Shteyngart, Gary",
        publisher: "02419",
        published: "2014-11-29",
        translator: None,
        summary: "Gary Shteyngart's parents dreamed that he would become a lawyer, or at least an \
            accountant, something their distracted son was simply not cut out to do.",
    },
];

impl Driver {
    /// Loads the demonstration dataset into the database.
    ///
    /// Publishers and books that already exist, as identified by their code and ISBN, are left
    /// untouched so that this can be called on every startup.
    pub(crate) async fn populate(self) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;

        let mut publishers = HashMap::with_capacity(PUBLISHERS.len());
        let mut new_publishers = 0;
        for (code, name) in PUBLISHERS {
            let code = PublisherCode::new(*code)?;
            let publisher = match db::find_publisher_by_code(tx.ex(), &code).await? {
                Some(publisher) => publisher,
                None => {
                    let publisher =
                        Publisher::new(EntityId::generate(), Version::initial(), code, *name)?;
                    new_publishers += 1;
                    repository::persist(UnitOfWork::join(&mut tx), publisher).await?
                }
            };
            publishers.insert(publisher.code().as_str().to_owned(), publisher);
        }

        let mut new_books = 0;
        for seed in BOOKS {
            let isbn = Isbn::new(seed.isbn)?;
            if db::find_book_by_isbn(tx.ex(), &isbn).await?.is_some() {
                continue;
            }

            let publisher = match publishers.get(seed.publisher) {
                Some(publisher) => publisher.clone(),
                None => {
                    return Err(DriverError::UnknownReference(format!(
                        "Seed book {} refers to unknown publisher {}",
                        seed.isbn, seed.publisher
                    )))
                }
            };
            let book = Book::new(
                EntityId::generate(),
                Version::initial(),
                isbn,
                seed.title,
                seed.author,
                publisher,
            )?
            .with_published(Some(parse_date(seed.published)?))
            .with_translator(seed.translator)
            .with_summary(Some(seed.summary));
            repository::persist(UnitOfWork::join(&mut tx), book).await?;
            new_books += 1;
        }

        let total_publishers = db::count_publishers(tx.ex()).await?;
        let total_books = db::count_books(tx.ex()).await?;
        tx.commit().await?;
        info!(
            "Populated database with {} new publishers and {} new books; catalog now has {} \
            publishers and {} books",
            new_publishers, new_books, total_publishers, total_books
        );
        Ok(())
    }
}
