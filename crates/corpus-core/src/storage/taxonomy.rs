//! Pillar / domain / topic navigation and the topic graph

use rusqlite::{params, OptionalExtension};

use super::sqlite::{require_topic, Result, Storage, StorageError};
use crate::model::{Domain, GraphEdge, GraphNode, Link, Pillar, Topic};

/// Relation used when a link does not name one
pub const DEFAULT_RELATION: &str = "related";

impl Storage {
    // ========================================================================
    // NAVIGATION
    // ========================================================================

    pub fn get_pillars(&self) -> Result<Vec<Pillar>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare("SELECT * FROM pillars ORDER BY sort_order, id")?;
        let rows = stmt.query_map([], row_to_pillar)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Domains by tier then sort order, optionally restricted to one pillar
    pub fn get_domains(&self, pillar_id: Option<&str>) -> Result<Vec<Domain>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM domains
             WHERE ?1 IS NULL OR pillar_id = ?1
             ORDER BY tier ASC, sort_order ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![pillar_id], row_to_domain)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Topics by sort order, optionally restricted to one domain
    pub fn get_topics(&self, domain_id: Option<&str>) -> Result<Vec<Topic>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM topics
             WHERE ?1 IS NULL OR domain_id = ?1
             ORDER BY sort_order ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![domain_id], row_to_topic)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn get_topic(&self, id: &str) -> Result<Option<Topic>> {
        let reader = self.lock_reader()?;
        let topic = reader
            .query_row("SELECT * FROM topics WHERE id = ?1", params![id], row_to_topic)
            .optional()?;
        Ok(topic)
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    pub fn upsert_pillar(&self, pillar: &Pillar) -> Result<()> {
        let writer = self.lock_writer()?;
        writer.execute(
            "INSERT INTO pillars (id, name, icon, color, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                icon = excluded.icon,
                color = excluded.color,
                sort_order = excluded.sort_order",
            params![pillar.id, pillar.name, pillar.icon, pillar.color, pillar.sort_order],
        )?;
        Ok(())
    }

    pub fn upsert_domain(&self, domain: &Domain) -> Result<()> {
        if !(1..=3).contains(&domain.tier) {
            return Err(StorageError::InvalidInput(format!(
                "Domain tier must be 1-3, got {}",
                domain.tier
            )));
        }
        let writer = self.lock_writer()?;
        writer.execute(
            "INSERT INTO domains (id, pillar_id, name, tier, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                pillar_id = excluded.pillar_id,
                name = excluded.name,
                tier = excluded.tier,
                sort_order = excluded.sort_order",
            params![domain.id, domain.pillar_id, domain.name, domain.tier, domain.sort_order],
        )?;
        Ok(())
    }

    pub fn upsert_topic(&self, topic: &Topic) -> Result<()> {
        let writer = self.lock_writer()?;
        writer.execute(
            "INSERT INTO topics (id, domain_id, name, content_path, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                domain_id = excluded.domain_id,
                name = excluded.name,
                content_path = excluded.content_path,
                sort_order = excluded.sort_order",
            params![topic.id, topic.domain_id, topic.name, topic.content_path, topic.sort_order],
        )?;
        Ok(())
    }

    /// Link two existing topics
    pub fn add_link(&self, source_id: &str, target_id: &str, relation: Option<&str>, weight: f64) -> Result<Link> {
        if source_id == target_id {
            return Err(StorageError::InvalidInput("A topic cannot link to itself".to_string()));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(StorageError::InvalidInput(format!("Invalid link weight: {}", weight)));
        }
        let relation = relation
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_RELATION);

        let writer = self.lock_writer()?;
        require_topic(&writer, source_id)?;
        require_topic(&writer, target_id)?;
        writer.execute(
            "INSERT INTO links (source_id, target_id, relation, weight) VALUES (?1, ?2, ?3, ?4)",
            params![source_id, target_id, relation, weight],
        )?;

        Ok(Link {
            id: writer.last_insert_rowid(),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            relation: relation.to_string(),
            weight,
        })
    }

    // ========================================================================
    // GRAPH
    // ========================================================================

    /// One node per topic with card totals, optionally for one pillar
    pub fn get_graph_nodes(&self, pillar_id: Option<&str>) -> Result<Vec<GraphNode>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT
                t.id, t.name, t.domain_id, d.pillar_id, d.tier,
                COUNT(c.id) AS card_count,
                COALESCE(SUM(CASE WHEN c.state = 2 THEN 1 ELSE 0 END), 0) AS mastered_count
             FROM topics t
             JOIN domains d ON t.domain_id = d.id
             LEFT JOIN cards c ON c.topic_id = t.id
             WHERE ?1 IS NULL OR d.pillar_id = ?1
             GROUP BY t.id
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map(params![pillar_id], |row| {
            Ok(GraphNode {
                id: row.get("id")?,
                name: row.get("name")?,
                domain_id: row.get("domain_id")?,
                pillar_id: row.get::<_, Option<String>>("pillar_id")?.unwrap_or_default(),
                tier: row.get::<_, Option<i32>>("tier")?.unwrap_or(2),
                card_count: row.get("card_count")?,
                mastered_count: row.get("mastered_count")?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Links, optionally only those whose source topic is in `pillar_id`
    pub fn get_graph_edges(&self, pillar_id: Option<&str>) -> Result<Vec<GraphEdge>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT l.id, l.source_id, l.target_id, l.relation, l.weight
             FROM links l
             LEFT JOIN topics ts ON l.source_id = ts.id
             LEFT JOIN domains ds ON ts.domain_id = ds.id
             WHERE ?1 IS NULL OR ds.pillar_id = ?1
             ORDER BY l.id",
        )?;
        let rows = stmt.query_map(params![pillar_id], |row| {
            Ok(GraphEdge {
                id: row.get("id")?,
                source: row.get("source_id")?,
                target: row.get("target_id")?,
                relation: row
                    .get::<_, Option<String>>("relation")?
                    .unwrap_or_else(|| DEFAULT_RELATION.to_string()),
                weight: row.get::<_, Option<f64>>("weight")?.unwrap_or(1.0),
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

fn row_to_pillar(row: &rusqlite::Row) -> rusqlite::Result<Pillar> {
    Ok(Pillar {
        id: row.get("id")?,
        name: row.get("name")?,
        icon: row.get("icon")?,
        color: row.get("color")?,
        sort_order: row.get::<_, Option<i32>>("sort_order")?.unwrap_or(0),
    })
}

fn row_to_domain(row: &rusqlite::Row) -> rusqlite::Result<Domain> {
    Ok(Domain {
        id: row.get("id")?,
        pillar_id: row.get::<_, Option<String>>("pillar_id")?.unwrap_or_default(),
        name: row.get("name")?,
        tier: row.get::<_, Option<i32>>("tier")?.unwrap_or(2),
        sort_order: row.get::<_, Option<i32>>("sort_order")?.unwrap_or(0),
    })
}

fn row_to_topic(row: &rusqlite::Row) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get("id")?,
        domain_id: row.get::<_, Option<String>>("domain_id")?.unwrap_or_default(),
        name: row.get("name")?,
        content_path: row.get("content_path")?,
        sort_order: row.get::<_, Option<i32>>("sort_order")?.unwrap_or(0),
    })
}
