//! Wiederherstellungs-Log
//!
//! Haelt alle bestaetigten Bans dauerhaft fest, damit ausstehende
//! Aufhebungen einen Neustart ueberstehen. Die Datei wird bei jeder
//! Aenderung vollstaendig neu geschrieben: erst in eine temporaere Datei,
//! dann per `rename` an ihren Platz.
//!
//! Format: JSON-Objekt, Identitaet -> Liste von
//! `[raum, dauer_sek, nachricht, frist_unix, name]`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::DateTime;

use shirk_core::types::SekundaereIdentitaet;

use crate::error::{GuardError, Result};
use crate::zustand::WiederherstellungsEintrag;

/// Eine Zeile im Log
type LogZeile = (String, u64, String, i64, String);

/// Dateiinhalt
type LogDatei = BTreeMap<String, Vec<LogZeile>>;

/// Dauerhafter Speicher fuer Wiederherstellungs-Eintraege
#[derive(Debug, Clone)]
pub struct WiederherstellungsLog {
    pfad: PathBuf,
}

impl WiederherstellungsLog {
    pub fn neu(pfad: impl Into<PathBuf>) -> Self {
        Self { pfad: pfad.into() }
    }

    pub fn pfad(&self) -> &Path {
        &self.pfad
    }

    /// Liest alle Eintraege; eine fehlende Datei ergibt ein leeres Log
    pub fn laden(&self) -> Result<Vec<WiederherstellungsEintrag>> {
        let inhalt = match std::fs::read_to_string(&self.pfad) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(quelle) => {
                return Err(GuardError::LogLesen {
                    pfad: self.pfad.clone(),
                    quelle,
                })
            }
        };
        if inhalt.trim().is_empty() {
            return Ok(Vec::new());
        }

        let datei: LogDatei = serde_json::from_str(&inhalt)?;
        let mut eintraege = Vec::new();
        for (identitaet, zeilen) in datei {
            for (raum, dauer_sek, nachricht, frist_unix, name) in zeilen {
                let frist = DateTime::from_timestamp(frist_unix, 0)
                    .ok_or(GuardError::Zeitstempel(frist_unix))?;
                eintraege.push(WiederherstellungsEintrag {
                    raum,
                    identitaet: SekundaereIdentitaet::neu(identitaet.clone()),
                    name,
                    frist,
                    dauer_sek,
                    nachricht,
                });
            }
        }
        Ok(eintraege)
    }

    /// Benennt eine unbrauchbare Log-Datei um, damit sie nicht ueberschrieben wird
    ///
    /// Ziel ist `<pfad>.kaputt`, bei Belegung `<pfad>.kaputt.1`, `.2`, ...
    pub fn beiseite_legen(&self) -> Result<PathBuf> {
        let mut basis = self.pfad.clone().into_os_string();
        basis.push(".kaputt");
        let basis = PathBuf::from(basis);

        let mut ziel = basis.clone();
        let mut n = 0u32;
        while ziel.exists() {
            n += 1;
            let mut naechstes = basis.clone().into_os_string();
            naechstes.push(format!(".{n}"));
            ziel = PathBuf::from(naechstes);
        }
        std::fs::rename(&self.pfad, &ziel).map_err(|quelle| GuardError::LogSchreiben {
            pfad: ziel.clone(),
            quelle,
        })?;
        Ok(ziel)
    }

    /// Schreibt alle Eintraege atomar
    pub fn schreiben<'a>(
        &self,
        eintraege: impl IntoIterator<Item = &'a WiederherstellungsEintrag>,
    ) -> Result<()> {
        let mut datei = LogDatei::new();
        for e in eintraege {
            datei
                .entry(e.identitaet.as_str().to_string())
                .or_default()
                .push((
                    e.raum.clone(),
                    e.dauer_sek,
                    e.nachricht.clone(),
                    e.frist.timestamp(),
                    e.name.clone(),
                ));
        }
        for zeilen in datei.values_mut() {
            zeilen.sort();
        }
        let json = serde_json::to_string_pretty(&datei)?;

        let schreibfehler = |quelle| GuardError::LogSchreiben {
            pfad: self.pfad.clone(),
            quelle,
        };
        if let Some(eltern) = self.pfad.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(eltern).map_err(schreibfehler)?;
        }
        let tmp = self.pfad.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(schreibfehler)?;
        std::fs::rename(&tmp, &self.pfad).map_err(schreibfehler)?;
        Ok(())
    }
}
