//! IRC-Transport
//!
//! Implementiert [`Transport`] ueber TCP oder TLS. Eine Verbindung laeuft
//! in einem eigenen tokio-Task, der die Zeilen des Servers in typisierte
//! [`TransportEreignis`]se uebersetzt und ausgehende Zeilen schreibt.
//! PING beantwortet der Task selbst.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_rustls::TlsConnector;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};

use shirk_core::error::{Result, ShirkError};
use shirk_core::event::TransportEreignis;
use shirk_core::transport::Transport;
use shirk_core::types::Quelle;
use shirk_dispatch::ist_raum;

use crate::config::VerbindungsEinstellungen;

/// Laengste akzeptierte Zeile (inkl. IRCv3-Tags)
const MAX_ZEILENLAENGE: usize = 8192;

/// Puffer fuer eingehende Ereignisse
const EREIGNIS_PUFFER: usize = 256;

// ---------------------------------------------------------------------------
// Zeilen-Parser
// ---------------------------------------------------------------------------

/// Eine zerlegte Protokollzeile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zeile {
    pub praefix: Option<String>,
    pub befehl: String,
    pub parameter: Vec<String>,
}

impl Zeile {
    /// `[@tags] [:praefix] BEFEHL param... [:rest]`
    pub fn parsen(roh: &str) -> Option<Self> {
        let mut rest = roh.trim_end_matches(['\r', '\n']);
        if rest.starts_with('@') {
            rest = rest.split_once(' ')?.1;
        }
        rest = rest.trim_start();

        let praefix = match rest.strip_prefix(':') {
            Some(p) => {
                let (praefix, danach) = p.split_once(' ')?;
                rest = danach;
                Some(praefix.to_string())
            }
            None => None,
        };

        let mut teile = rest.trim_start().splitn(2, ' ');
        let befehl = teile.next().filter(|b| !b.is_empty())?.to_ascii_uppercase();
        let mut rest = teile.next().unwrap_or_default();

        let mut parameter = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(letzter) = rest.strip_prefix(':') {
                parameter.push(letzter.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((p, danach)) => {
                    parameter.push(p.to_string());
                    rest = danach;
                }
                None => {
                    parameter.push(rest.to_string());
                    break;
                }
            }
        }

        Some(Self {
            praefix,
            befehl,
            parameter,
        })
    }

    fn quelle(&self) -> Quelle {
        Quelle::parsen(self.praefix.as_deref().unwrap_or_default())
    }

    fn param(&self, i: usize) -> String {
        self.parameter.get(i).cloned().unwrap_or_default()
    }
}

/// Modi, die immer ein Argument verbrauchen
const MODI_MIT_ARGUMENT: &[char] = &['b', 'e', 'I', 'k', 'o', 'v', 'h', 'q', 'a'];

/// Zerlegt `+bo-v maske nick nick` in einzelne Aenderungen
pub fn modi_zerlegen(modi: &str, argumente: &[String]) -> Vec<(bool, char, Vec<String>)> {
    let mut argumente = argumente.iter();
    let mut hinzu = true;
    let mut ergebnis = Vec::new();
    for c in modi.chars() {
        match c {
            '+' => hinzu = true,
            '-' => hinzu = false,
            modus => {
                let nimmt_argument =
                    MODI_MIT_ARGUMENT.contains(&modus) || (modus == 'l' && hinzu);
                let argument = if nimmt_argument {
                    argumente.next().cloned().into_iter().collect()
                } else {
                    Vec::new()
                };
                ergebnis.push((hinzu, modus, argument));
            }
        }
    }
    ergebnis
}

/// Uebersetzt eine Zeile in Transport-Ereignisse
///
/// Unbekannte Befehle ergeben keine Ereignisse.
pub fn uebersetzen(zeile: &Zeile) -> Vec<TransportEreignis> {
    let quelle = zeile.quelle();
    match zeile.befehl.as_str() {
        "001" => vec![TransportEreignis::Angemeldet],
        "JOIN" => vec![TransportEreignis::Beigetreten {
            name: quelle.nick,
            benutzer: quelle.benutzer.unwrap_or_default(),
            host: quelle.host.unwrap_or_default(),
            raum: zeile.param(0),
        }],
        "PART" => vec![TransportEreignis::Verlassen {
            name: quelle.nick,
            raum: zeile.param(0),
        }],
        "KICK" => vec![TransportEreignis::Gekickt {
            raum: zeile.param(0),
            name: zeile.param(1),
            kicker: quelle.nick,
            grund: zeile.param(2),
        }],
        "QUIT" => vec![TransportEreignis::Beendet { name: quelle.nick }],
        "NICK" => vec![TransportEreignis::Umbenannt {
            alt: quelle.nick,
            neu: zeile.param(0),
        }],
        "MODE" => {
            let raum = zeile.param(0);
            // Benutzermodi interessieren nicht
            if !ist_raum(&raum) || zeile.parameter.len() < 2 {
                return Vec::new();
            }
            modi_zerlegen(&zeile.parameter[1], &zeile.parameter[2..])
                .into_iter()
                .map(|(hinzugefuegt, modus, argumente)| TransportEreignis::ModusGeaendert {
                    quelle: quelle.nick.clone(),
                    raum: raum.clone(),
                    hinzugefuegt,
                    modus,
                    argumente,
                })
                .collect()
        }
        "PRIVMSG" => {
            let text = zeile.param(1);
            let (text, ist_aktion) = if text.starts_with('\u{1}') {
                match text.trim_matches('\u{1}').strip_prefix("ACTION ") {
                    Some(aktion) => (aktion.to_string(), true),
                    // Andere CTCP-Anfragen (VERSION, PING ...) werden ignoriert
                    None => return Vec::new(),
                }
            } else {
                (text, false)
            };
            vec![TransportEreignis::Nachricht {
                quelle: quelle.nick,
                ziel: zeile.param(0),
                text,
                ist_aktion,
            }]
        }
        code => match code.parse::<u16>() {
            Ok(code) if zeile.befehl.len() == 3 => vec![TransportEreignis::Numerisch {
                code,
                parameter: zeile.parameter.clone(),
            }],
            _ => Vec::new(),
        },
    }
}

/// Ersetzt Zeilenumbrueche durch Leerzeichen
fn einzeilig(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// IRC-Client ueber TCP oder TLS
pub struct IrcTransport {
    einstellungen: VerbindungsEinstellungen,
    /// Ausgehende Zeilen an den Verbindungs-Task
    ausgang: Option<mpsc::UnboundedSender<String>>,
}

impl IrcTransport {
    pub fn neu(einstellungen: VerbindungsEinstellungen) -> Self {
        Self {
            einstellungen,
            ausgang: None,
        }
    }

    fn zeile_senden(&self, zeile: String) -> Result<()> {
        let ausgang = self
            .ausgang
            .as_ref()
            .ok_or_else(|| ShirkError::Getrennt("nicht verbunden".into()))?;
        ausgang
            .send(zeile)
            .map_err(|_| ShirkError::Getrennt("Verbindungs-Task beendet".into()))
    }

    /// PASS, NICK und USER
    fn registrieren(&self) -> Result<()> {
        let e = &self.einstellungen;
        if let Some(passwort) = e.passwort.as_deref().filter(|p| !p.is_empty()) {
            self.zeile_senden(format!("PASS {passwort}"))?;
        }
        self.zeile_senden(format!("NICK {}", e.nickname))?;
        self.zeile_senden(format!("USER {} 0 * :{}", e.username, e.realname))
    }

    fn tls_connector() -> Result<TlsConnector> {
        let mut wurzeln = rustls::RootCertStore::empty();
        wurzeln.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = rustls::ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .map_err(|e| ShirkError::Konfiguration(format!("TLS: {e}")))?
        .with_root_certificates(wurzeln)
        .with_no_client_auth();
        Ok(TlsConnector::from(Arc::new(config)))
    }
}

impl Transport for IrcTransport {
    async fn verbinden(&mut self) -> Result<mpsc::Receiver<TransportEreignis>> {
        let adresse = format!("{}:{}", self.einstellungen.server, self.einstellungen.port);
        let tcp = TcpStream::connect(&adresse)
            .await
            .map_err(|e| ShirkError::Verbindung(format!("{adresse}: {e}")))?;

        let (ereignis_tx, ereignis_rx) = mpsc::channel(EREIGNIS_PUFFER);
        let (zeilen_tx, zeilen_rx) = mpsc::unbounded_channel();

        if self.einstellungen.tls {
            let server_name =
                rustls::pki_types::ServerName::try_from(self.einstellungen.server.clone())
                    .map_err(|e| ShirkError::Konfiguration(format!("Servername: {e}")))?;
            let stream = Self::tls_connector()?
                .connect(server_name, tcp)
                .await
                .map_err(|e| ShirkError::Verbindung(format!("TLS-Handshake mit {adresse}: {e}")))?;
            tokio::spawn(verbindung_betreiben(stream, zeilen_rx, ereignis_tx));
        } else {
            tokio::spawn(verbindung_betreiben(tcp, zeilen_rx, ereignis_tx));
        }

        info!(adresse = %adresse, tls = self.einstellungen.tls, "Verbunden");
        self.ausgang = Some(zeilen_tx);
        self.registrieren()?;
        Ok(ereignis_rx)
    }

    fn beitreten(&mut self, raum: &str) -> Result<()> {
        self.zeile_senden(format!("JOIN {}", einzeilig(raum)))
    }

    fn roh_senden(&mut self, zeile: &str) -> Result<()> {
        self.zeile_senden(einzeilig(zeile))
    }

    fn kick_anfordern(&mut self, raum: &str, name: &str, grund: &str) -> Result<()> {
        self.zeile_senden(format!(
            "KICK {} {} :{}",
            einzeilig(raum),
            einzeilig(name),
            einzeilig(grund)
        ))
    }

    fn modus_aendern(&mut self, raum: &str, modus: &str) -> Result<()> {
        self.zeile_senden(format!("MODE {} {}", einzeilig(raum), einzeilig(modus)))
    }

    fn nachricht_senden(&mut self, ziel: &str, text: &str) -> Result<()> {
        for zeile in text.lines().filter(|z| !z.is_empty()) {
            self.zeile_senden(format!("PRIVMSG {} :{}", einzeilig(ziel), zeile))?;
        }
        Ok(())
    }

    fn beenden(&mut self, nachricht: &str) -> Result<()> {
        self.zeile_senden(format!("QUIT :{}", einzeilig(nachricht)))
    }
}

/// Verbindungs-Task: liest Zeilen, schreibt Zeilen, beantwortet PING
///
/// Endet mit genau einem [`TransportEreignis::Getrennt`].
async fn verbindung_betreiben<S>(
    stream: S,
    mut zeilen: mpsc::UnboundedReceiver<String>,
    ereignisse: mpsc::Sender<TransportEreignis>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_ZEILENLAENGE));

    let grund = loop {
        tokio::select! {
            eingang = framed.next() => {
                let roh = match eingang {
                    Some(Ok(roh)) => roh,
                    Some(Err(e)) => break format!("Lesefehler: {e}"),
                    None => break "Verbindung vom Server geschlossen".to_string(),
                };
                let Some(zeile) = Zeile::parsen(&roh) else {
                    warn!(zeile = %roh, "Unlesbare Zeile ignoriert");
                    continue;
                };
                debug!(zeile = %roh, "<-");
                match zeile.befehl.as_str() {
                    "PING" => {
                        let antwort = format!("PONG :{}", zeile.param(0));
                        if let Err(e) = framed.send(antwort).await {
                            break format!("Schreibfehler: {e}");
                        }
                    }
                    "ERROR" => break zeile.param(0),
                    _ => {
                        for ereignis in uebersetzen(&zeile) {
                            if ereignisse.send(ereignis).await.is_err() {
                                // Empfaenger weg, niemand wartet mehr auf Getrennt
                                return;
                            }
                        }
                    }
                }
            }

            ausgehend = zeilen.recv() => {
                let Some(zeile) = ausgehend else {
                    break "Transport geschlossen".to_string();
                };
                debug!(zeile = %zeile, "->");
                if let Err(e) = framed.send(zeile).await {
                    break format!("Schreibfehler: {e}");
                }
            }
        }
    };

    info!(grund = %grund, "Verbindung beendet");
    let _ = ereignisse.send(TransportEreignis::Getrennt { grund }).await;
}
